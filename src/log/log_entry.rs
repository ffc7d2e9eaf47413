use std::{
    fmt, io,
    marker::PhantomData,
    mem,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    thread::{self, ThreadId},
};

use parking_lot::{Mutex, RawMutex, lock_api::ArcMutexGuard};

use crate::log::{log_level::LogLevel, log_sink::LogSink, session::Session};

/// Lock guard over an entry's state that owns its own reference to the mutex.
pub(crate) type StateGuard = ArcMutexGuard<RawMutex, EntryState>;

/// Per-destination registration settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogOptions {
    /// Hold the entry lock for a session's whole lifetime, not just its merge.
    pub thread_safe: bool,
    /// Open the file in append mode instead of truncating it.
    pub append: bool,
    /// Most verbose level the entry accepts.
    pub threshold: LogLevel,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            thread_safe: false,
            append: false,
            threshold: LogLevel::Debug1,
        }
    }
}

impl LogOptions {
    #[must_use]
    pub fn thread_safe(mut self, thread_safe: bool) -> Self {
        self.thread_safe = thread_safe;
        self
    }

    #[must_use]
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    #[must_use]
    pub fn threshold(mut self, threshold: LogLevel) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Everything the entry lock protects: the accumulation buffer and the sink.
pub struct EntryState {
    pub(crate) buffer: String,
    pub(crate) sink: Box<dyn LogSink>,
}

impl EntryState {
    /// Moves the buffered text into the sink and flushes it.
    ///
    /// The buffer is emptied even when the sink fails.
    pub(crate) fn drain(&mut self) -> io::Result<usize> {
        if self.buffer.is_empty() {
            return Ok(0);
        }
        let text = mem::take(&mut self.buffer);
        self.sink.write(&text)?;
        self.sink.flush()?;
        Ok(text.len())
    }

    /// Text merged but not yet drained.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// One registered destination.
pub struct LogEntry {
    index: usize,
    name: String,
    path: Option<PathBuf>,
    thread_safe: bool,
    threshold: AtomicU8,
    state: Arc<Mutex<EntryState>>,
    /// Lines written while an [`EntryGuard`] is held, published on unlock.
    staged: Arc<Mutex<String>>,
    /// Thread currently holding the [`EntryGuard`], if any.
    group_owner: Mutex<Option<ThreadId>>,
}

impl fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEntry")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("thread_safe", &self.thread_safe)
            .field("threshold", &self.threshold())
            .finish_non_exhaustive()
    }
}

impl LogEntry {
    pub(crate) fn new(index: usize, sink: Box<dyn LogSink>, options: LogOptions) -> Self {
        Self {
            index,
            name: sink.name().to_string(),
            path: sink.path().map(Path::to_path_buf),
            thread_safe: options.thread_safe,
            threshold: AtomicU8::new(options.threshold.bits()),
            state: Arc::new(Mutex::new(EntryState {
                buffer: String::new(),
                sink,
            })),
            staged: Arc::new(Mutex::new(String::new())),
            group_owner: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem path of the destination, for file-backed sinks.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether `sink` would write to the same destination as this entry.
    ///
    /// File sinks compare by path, so two distinct paths never collide even
    /// when their display names do. Other sinks compare by name.
    pub(crate) fn same_destination(&self, sink: &dyn LogSink) -> bool {
        match (self.path(), sink.path()) {
            (Some(mine), Some(theirs)) => mine == theirs,
            (None, None) => self.name == sink.name(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_thread_safe(&self) -> bool {
        self.thread_safe
    }

    #[must_use]
    pub fn threshold(&self) -> LogLevel {
        // Only ever stored from a LogLevel.
        LogLevel::from_bits(self.threshold.load(Ordering::Relaxed)).unwrap_or(LogLevel::Debug1)
    }

    pub fn set_threshold(&self, level: LogLevel) {
        self.threshold.store(level.bits(), Ordering::Relaxed);
    }

    /// Whether `level` is no more verbose than the configured threshold.
    #[inline]
    #[must_use]
    pub fn accepts(&self, level: LogLevel) -> bool {
        level <= self.threshold()
    }

    /// Opens a session on this entry, taking the lock up front when the entry
    /// is thread-safe.
    ///
    /// When the calling thread holds this entry's [`EntryGuard`], the line is
    /// staged with the guard's other lines instead of waiting for the lock.
    pub(crate) fn session(&self, level: LogLevel) -> Session<'static> {
        if self.grouped_by_current_thread() {
            Session::staged(Arc::clone(&self.staged), level)
        } else if self.thread_safe {
            Session::held(self.state.lock_arc(), level)
        } else {
            Session::deferred(Arc::clone(&self.state), level)
        }
    }

    fn grouped_by_current_thread(&self) -> bool {
        *self.group_owner.lock() == Some(thread::current().id())
    }

    pub(crate) fn lock_arc(&self) -> StateGuard {
        self.state.lock_arc()
    }

    /// Drains buffered text into the sink under the entry lock.
    ///
    /// # Errors
    /// Returns the sink's write or flush error. The buffered text is dropped in
    /// that case.
    pub fn drain(&self) -> io::Result<usize> {
        self.state.lock().drain()
    }

    /// Drains, then closes the sink.
    ///
    /// # Errors
    /// Returns the first drain or close error; the sink is closed either way.
    pub fn close(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        let drained = state.drain().map(|_| ());
        let closed = state.sink.close();
        drained.and(closed)
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    #[must_use]
    pub fn sink_is_open(&self) -> bool {
        self.state.lock().sink.is_open()
    }
}

/// Exclusive hold on one entry, for grouping several writes into one unit.
///
/// Lines written while the guard is held, through [`EntryGuard::session`] or
/// through the registry's `get` (and `logfile!`) on this thread for the same
/// entry, are staged in order and published to the entry's buffer as one
/// block when the guard is dropped or [`EntryGuard::unlock`] is called.
///
/// The guard holds the entry lock, so on the holding thread do not call
/// anything else that takes it: `flush`, registration or `close_logs` on the
/// registry would wait for this very lock.
pub struct EntryGuard<'a> {
    entry: Arc<LogEntry>,
    state: StateGuard,
    _registry: PhantomData<&'a ()>,
}

impl EntryGuard<'_> {
    pub(crate) fn new(entry: Arc<LogEntry>) -> Self {
        let state = entry.lock_arc();
        *entry.group_owner.lock() = Some(thread::current().id());
        Self {
            entry,
            state,
            _registry: PhantomData,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.entry.index()
    }

    /// Composes one line into the held entry.
    pub fn session(&mut self, level: LogLevel) -> Session<'_> {
        Session::grouped(&self.entry.staged, level)
    }

    /// Lines written under this guard that are not published yet.
    #[must_use]
    pub fn staged(&self) -> String {
        self.entry.staged.lock().clone()
    }

    /// Text merged before the guard was taken and not yet drained.
    #[must_use]
    pub fn pending(&self) -> &str {
        self.state.pending()
    }

    pub fn unlock(self) {}
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        let staged = mem::take(&mut *self.entry.staged.lock());
        self.state.buffer.push_str(&staged);
        *self.entry.group_owner.lock() = None;
        // The entry lock is released right after this, when `state` drops.
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::memory_sink::MemorySink;

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn name(&self) -> &str {
            "broken"
        }
        fn write(&mut self, _text: &str) -> io::Result<()> {
            Err(io::Error::other("disk on fire"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn is_open(&self) -> bool {
            false
        }
    }

    fn entry_with(sink: MemorySink, options: LogOptions) -> LogEntry {
        LogEntry::new(0, Box::new(sink), options)
    }

    #[test]
    fn threshold_is_ordinal() {
        let entry = entry_with(
            MemorySink::new("m"),
            LogOptions::default().threshold(LogLevel::Info),
        );
        assert!(entry.accepts(LogLevel::Fatal));
        assert!(entry.accepts(LogLevel::Info));
        assert!(!entry.accepts(LogLevel::Debug1));

        entry.set_threshold(LogLevel::Debug3);
        assert_eq!(entry.threshold(), LogLevel::Debug3);
        assert!(entry.accepts(LogLevel::Debug2));
    }

    #[test]
    fn drain_moves_buffer_and_flushes() {
        let sink = MemorySink::new("m");
        let entry = entry_with(sink.clone(), LogOptions::default());
        entry.lock_arc().buffer.push_str("line\n");

        assert_eq!(entry.drain().unwrap(), 5);
        assert_eq!(sink.contents(), "line\n");
        assert_eq!(sink.flush_count(), 1);
        assert_eq!(entry.pending_len(), 0);
    }

    #[test]
    fn empty_drain_leaves_sink_untouched() {
        let sink = MemorySink::new("m");
        let entry = entry_with(sink.clone(), LogOptions::default());
        assert_eq!(entry.drain().unwrap(), 0);
        assert_eq!(sink.flush_count(), 0);
        assert!(!entry.sink_is_open());
    }

    #[test]
    fn failed_drain_still_clears_buffer() {
        let entry = LogEntry::new(0, Box::new(BrokenSink), LogOptions::default());
        entry.lock_arc().buffer.push_str("lost\n");
        assert!(entry.drain().is_err());
        assert_eq!(entry.pending_len(), 0);
    }

    #[test]
    fn close_drains_before_closing() {
        let sink = MemorySink::new("m");
        let entry = entry_with(sink.clone(), LogOptions::default());
        entry.lock_arc().buffer.push_str("tail\n");
        entry.close().unwrap();
        assert_eq!(sink.contents(), "tail\n");
        assert!(!entry.sink_is_open());
    }

    #[test]
    fn guard_sessions_publish_on_unlock() {
        let entry = Arc::new(entry_with(MemorySink::new("m"), LogOptions::default()));
        let mut guard = EntryGuard::new(Arc::clone(&entry));
        guard.session(LogLevel::Info).append("one");
        guard.session(LogLevel::Info).append("two");
        assert!(guard.pending().is_empty());

        let staged = guard.staged();
        guard.unlock();

        let lines: Vec<&str> = staged.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO: one"));
        assert!(lines[1].ends_with("INFO: two"));
        assert_eq!(entry.pending_len(), staged.len());
    }

    #[test]
    fn holding_thread_stages_plain_sessions_in_order() {
        for thread_safe in [false, true] {
            let entry = Arc::new(entry_with(
                MemorySink::new("m"),
                LogOptions::default().thread_safe(thread_safe),
            ));
            let mut guard = EntryGuard::new(Arc::clone(&entry));
            guard.session(LogLevel::Info).append("first");
            entry.session(LogLevel::Warning).append("second");
            guard.session(LogLevel::Info).append("third");
            guard.unlock();

            let text = entry.lock_arc().pending().to_string();
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines.len(), 3);
            assert!(lines[0].ends_with("INFO: first"));
            assert!(lines[1].ends_with("WARNING: second"));
            assert!(lines[2].ends_with("INFO: third"));
        }
    }

    #[test]
    fn other_threads_wait_for_the_guard() {
        let entry = Arc::new(entry_with(MemorySink::new("m"), LogOptions::default()));
        let mut guard = EntryGuard::new(Arc::clone(&entry));
        guard.session(LogLevel::Info).append("grouped");

        let worker = {
            let entry = Arc::clone(&entry);
            thread::spawn(move || {
                let mut s = entry.session(LogLevel::Error);
                s.append("outside");
            })
        };
        thread::sleep(std::time::Duration::from_millis(50));
        assert!(!worker.is_finished());
        guard.unlock();
        worker.join().unwrap();

        let text = entry.lock_arc().pending().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO: grouped"));
        assert!(lines[1].ends_with("ERROR: outside"));
    }
}
