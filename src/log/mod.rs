pub mod file_sink;
pub mod flusher;
pub mod log_entry;
pub mod log_error;
pub mod log_level;
pub mod log_macros;
pub mod log_sink;
pub mod memory_sink;
pub mod registry;
pub mod session;
pub mod timestamp;

pub use file_sink::FileSink;
pub use flusher::{BackgroundFlusher, DrainReport};
pub use log_entry::{EntryGuard, LogEntry, LogOptions};
pub use log_error::{LogError, Result};
pub use log_level::{LOG_MAX_LEVEL, LevelMask, LogLevel};
pub use log_sink::LogSink;
pub use memory_sink::MemorySink;
pub use registry::LogRegistry;
pub use session::Session;
