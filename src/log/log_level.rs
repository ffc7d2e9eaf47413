use std::{fmt, str::FromStr};

use crate::log::log_error::LogError;

/// Defines the severity levels for log messages.
///
/// Each level occupies its own bit so whole levels can be switched off with a
/// [`LevelMask`], while the declaration order gives the ordinal scale used by
/// per-entry thresholds: `Fatal` is the least verbose, `Debug4` the most.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    /// Unrecoverable failures.
    Fatal = 1 << 0,
    /// Error events that might still allow the application to continue running.
    Error = 1 << 1,
    /// Potentially harmful situations.
    Warning = 1 << 2,
    /// Coarse-grained progress messages.
    Info = 1 << 3,
    /// First (least chatty) debugging level.
    Debug1 = 1 << 4,
    Debug2 = 1 << 5,
    Debug3 = 1 << 6,
    /// Most verbose debugging level.
    Debug4 = 1 << 7,
}

impl LogLevel {
    /// All levels, least verbose first.
    pub const ALL: [LogLevel; 8] = [
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug1,
        LogLevel::Debug2,
        LogLevel::Debug3,
        LogLevel::Debug4,
    ];

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Maps a single-bit value back to its level. Combined or empty bit
    /// patterns are not levels and yield `None`.
    #[must_use]
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|lvl| lvl.bits() == bits)
    }

    /// Upper-case label written into each line header.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug1 => "DEBUG1",
            LogLevel::Debug2 => "DEBUG2",
            LogLevel::Debug3 => "DEBUG3",
            LogLevel::Debug4 => "DEBUG4",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_more_verbose_than(self, other: LogLevel) -> bool {
        self > other
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fatal" => Ok(LogLevel::Fatal),
            "error" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "info" => Ok(LogLevel::Info),
            "debug1" | "debug" => Ok(LogLevel::Debug1),
            "debug2" => Ok(LogLevel::Debug2),
            "debug3" => Ok(LogLevel::Debug3),
            "debug4" => Ok(LogLevel::Debug4),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

/// Set of independently enabled levels.
///
/// The mask only removes levels; ordering is left to the per-entry threshold.
/// A mask with a hole in the middle (say `Info` off, `Debug1` on) is honored as
/// written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelMask(u8);

impl LevelMask {
    pub const ALL: LevelMask = LevelMask(u8::MAX);
    pub const NONE: LevelMask = LevelMask(0);

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Every level up to and including `level`.
    #[must_use]
    pub const fn up_to(level: LogLevel) -> Self {
        // Bits grow with verbosity, so "up to" is every lower bit plus this one.
        Self(level.bits() | (level.bits() - 1))
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, level: LogLevel) -> bool {
        self.0 & level.bits() != 0
    }

    #[must_use]
    pub const fn with(self, level: LogLevel) -> Self {
        Self(self.0 | level.bits())
    }

    #[must_use]
    pub const fn without(self, level: LogLevel) -> Self {
        Self(self.0 & !level.bits())
    }

    #[must_use]
    pub const fn intersect(self, other: LevelMask) -> Self {
        Self(self.0 & other.0)
    }
}

impl Default for LevelMask {
    fn default() -> Self {
        LOG_MAX_LEVEL
    }
}

const fn feature_bit(enabled: bool, level: LogLevel) -> u8 {
    if enabled { level.bits() } else { 0 }
}

/// Levels compiled into this build, selected through the `log-*` cargo features.
pub const LOG_MAX_LEVEL: LevelMask = LevelMask(
    feature_bit(cfg!(feature = "log-fatal"), LogLevel::Fatal)
        | feature_bit(cfg!(feature = "log-error"), LogLevel::Error)
        | feature_bit(cfg!(feature = "log-warning"), LogLevel::Warning)
        | feature_bit(cfg!(feature = "log-info"), LogLevel::Info)
        | feature_bit(cfg!(feature = "log-debug1"), LogLevel::Debug1)
        | feature_bit(cfg!(feature = "log-debug2"), LogLevel::Debug2)
        | feature_bit(cfg!(feature = "log-debug3"), LogLevel::Debug3)
        | feature_bit(cfg!(feature = "log-debug4"), LogLevel::Debug4),
);
