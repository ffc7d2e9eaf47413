use std::{io, path::Path};

/// A durable destination that drained entry text is written to.
///
/// Sinks are owned exclusively by one registered entry and are only touched
/// while that entry's lock is held, so they need `Send` but not `Sync`.
pub trait LogSink: Send {
    /// Identifies the destination; two registrations may not share a name.
    fn name(&self) -> &str;

    /// Backing file, for sinks that have one. Registrations of file sinks are
    /// told apart by this path rather than by [`name`](Self::name).
    fn path(&self) -> Option<&Path> {
        None
    }

    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Forces buffered bytes out to the backing medium.
    fn flush(&mut self) -> io::Result<()>;

    /// Releases the underlying resource. Called once, at registry teardown.
    fn close(&mut self) -> io::Result<()>;

    fn is_open(&self) -> bool;
}
