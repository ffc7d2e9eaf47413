//! Logtools is a buffered, multi-destination file logging library.
//!
//! Callers register destinations with a [`LogRegistry`], write leveled and
//! timestamped lines through short-lived [`Session`]s, and a background
//! flusher periodically moves each destination's buffered text into its sink.
//!
//! ```rust,ignore
//! use logtools::{LogLevel, LogOptions, LogRegistry, logfile};
//!
//! let registry = LogRegistry::new();
//! let app = registry.register_new_log("app.log", LogOptions::default())?;
//! registry.start();
//! logfile!(registry, app, LogLevel::Info, "listening on {}", addr);
//! registry.close_logs();
//! ```

/// INI configuration loading and flusher settings.
pub mod config;
/// Registry, sessions, sinks and the background flusher.
pub mod log;

pub use config::{Config, FlusherConfig, LogSpec};
pub use log::{
    BackgroundFlusher, DrainReport, EntryGuard, FileSink, LOG_MAX_LEVEL, LevelMask, LogError,
    LogLevel, LogOptions, LogRegistry, LogSink, MemorySink, Session,
};
