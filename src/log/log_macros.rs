//! Leveled logging macros over a [`LogRegistry`](crate::log::registry::LogRegistry).
//!
//! # Feature Flags
//! Specific log levels are controlled by cargo features:
//! `log-fatal`, `log-error`, `log-warning`, `log-info`, `log-debug1` .. `log-debug4`.
//!
//! If a feature is disabled, the corresponding level macro expands to `()`,
//! removing all formatting and allocation overhead at compile time. The generic
//! `logfile!` still checks the compiled-in mask before doing any work.

// ============================================================================
// 1. GENERIC MACROS
// ============================================================================

/// Writes one formatted line to entry `index` if the level passes both the
/// global mask and the entry's threshold. Nothing is formatted otherwise.
///
/// Safe to use while this thread holds the entry's guard from `logfile_lock!`:
/// the line joins the guard's group.
#[macro_export]
macro_rules! logfile {
    ($registry:expr, $index:expr, $lvl:expr, $($arg:tt)*) => {{
        let __registry = &$registry;
        let __index: usize = $index;
        let __lvl: $crate::log::log_level::LogLevel = $lvl;
        if $crate::log::log_level::LOG_MAX_LEVEL.contains(__lvl) && __registry.enabled(__index, __lvl) {
            let mut __session = __registry.get(__index, __lvl);
            let _ = ::std::fmt::Write::write_fmt(&mut __session, format_args!($($arg)*));
        }
    }};
}

/// Locks entry `index` for grouped writes when `level` would be logged there.
/// Evaluates to `Option<EntryGuard>`.
#[macro_export]
macro_rules! logfile_lock {
    ($registry:expr, $index:expr, $lvl:expr) => {{
        let __registry = &$registry;
        let __index: usize = $index;
        if __registry.enabled(__index, $lvl) {
            __registry.lock(__index)
        } else {
            None
        }
    }};
}

// ============================================================================
// 2. LEVEL-SPECIFIC MACROS (Feature Gated)
// ============================================================================

// ---------------------- FATAL ----------------------
#[cfg(feature = "log-fatal")]
#[macro_export]
macro_rules! log_fatal { ($registry:expr, $index:expr, $($arg:tt)*) => { $crate::logfile!($registry, $index, $crate::log::log_level::LogLevel::Fatal, $($arg)*) } }

#[cfg(not(feature = "log-fatal"))]
#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- ERROR ----------------------
#[cfg(feature = "log-error")]
#[macro_export]
macro_rules! log_error { ($registry:expr, $index:expr, $($arg:tt)*) => { $crate::logfile!($registry, $index, $crate::log::log_level::LogLevel::Error, $($arg)*) } }

#[cfg(not(feature = "log-error"))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- WARNING ----------------------
#[cfg(feature = "log-warning")]
#[macro_export]
macro_rules! log_warning { ($registry:expr, $index:expr, $($arg:tt)*) => { $crate::logfile!($registry, $index, $crate::log::log_level::LogLevel::Warning, $($arg)*) } }

#[cfg(not(feature = "log-warning"))]
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- INFO ----------------------
#[cfg(feature = "log-info")]
#[macro_export]
macro_rules! log_info { ($registry:expr, $index:expr, $($arg:tt)*) => { $crate::logfile!($registry, $index, $crate::log::log_level::LogLevel::Info, $($arg)*) } }

#[cfg(not(feature = "log-info"))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- DEBUG ----------------------
// `log_debug!` is DEBUG1; the deeper levels get their own macro.
#[cfg(feature = "log-debug1")]
#[macro_export]
macro_rules! log_debug { ($registry:expr, $index:expr, $($arg:tt)*) => { $crate::logfile!($registry, $index, $crate::log::log_level::LogLevel::Debug1, $($arg)*) } }

#[cfg(not(feature = "log-debug1"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        ()
    };
}

#[cfg(feature = "log-debug2")]
#[macro_export]
macro_rules! log_debug2 { ($registry:expr, $index:expr, $($arg:tt)*) => { $crate::logfile!($registry, $index, $crate::log::log_level::LogLevel::Debug2, $($arg)*) } }

#[cfg(not(feature = "log-debug2"))]
#[macro_export]
macro_rules! log_debug2 {
    ($($arg:tt)*) => {
        ()
    };
}

#[cfg(feature = "log-debug3")]
#[macro_export]
macro_rules! log_debug3 { ($registry:expr, $index:expr, $($arg:tt)*) => { $crate::logfile!($registry, $index, $crate::log::log_level::LogLevel::Debug3, $($arg)*) } }

#[cfg(not(feature = "log-debug3"))]
#[macro_export]
macro_rules! log_debug3 {
    ($($arg:tt)*) => {
        ()
    };
}

#[cfg(feature = "log-debug4")]
#[macro_export]
macro_rules! log_debug4 { ($registry:expr, $index:expr, $($arg:tt)*) => { $crate::logfile!($registry, $index, $crate::log::log_level::LogLevel::Debug4, $($arg)*) } }

#[cfg(not(feature = "log-debug4"))]
#[macro_export]
macro_rules! log_debug4 {
    ($($arg:tt)*) => {
        ()
    };
}
