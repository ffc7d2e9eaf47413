use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::log::log_sink::LogSink;

/// In-memory destination.
///
/// Clones share the same contents, so a caller can keep one handle and hand
/// the other to the registry.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    name: String,
    contents: Arc<Mutex<String>>,
    open: Arc<AtomicBool>,
    flushes: Arc<AtomicUsize>,
}

impl MemorySink {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        self.contents.lock().clone()
    }

    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.open.store(true, Ordering::Relaxed);
        self.contents.lock().push_str(text);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.open.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }
}
