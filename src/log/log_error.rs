use std::io;

use thiserror::Error;

/// Errors reported by the log registry and its configuration layer.
///
/// These are expected, recoverable conditions: callers check them and carry on.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log destination name must not be empty")]
    EmptyName,
    #[error("log destination already registered: {0}")]
    DuplicateName(String),
    #[error("no log registered at index {0}")]
    InvalidIndex(usize),
    #[error("unknown log level: {0:?}")]
    InvalidLevel(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, LogError>;
