use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
    time::Duration,
};

use parking_lot::{Mutex, RwLock};

use crate::{
    config::{Config, FlusherConfig},
    log::{
        file_sink::FileSink,
        flusher::{BackgroundFlusher, DrainReport, Entries, drain_all},
        log_entry::{EntryGuard, LogEntry, LogOptions},
        log_error::{LogError, Result},
        log_level::{LOG_MAX_LEVEL, LevelMask, LogLevel},
        log_sink::LogSink,
        session::Session,
    },
};

/// Ordered set of log destinations plus the flusher that drains them.
///
/// Destinations are addressed by the index returned at registration; indices
/// start at 0, follow registration order, and are never reused while the
/// registry is open.
///
/// # Architecture
///
/// 1. **Producers**: caller threads open a [`Session`] with [`get`](Self::get),
///    compose a line, and the session merges it into the entry's buffer on drop.
/// 2. **Entries**: each has its own lock guarding its buffer and sink.
/// 3. **Consumer**: a [`BackgroundFlusher`] drains every buffer into its sink
///    once per write interval.
/// 4. **Registration**: stops the flusher, appends, then restarts it, so the
///    flusher never walks the sequence while it grows.
///
/// # Example
///
/// ```rust,ignore
/// let registry = LogRegistry::new();
/// let app = registry.register_new_log("app.log", LogOptions::default().threshold(LogLevel::Info))?;
/// registry.start();
/// logfile!(registry, app, LogLevel::Error, "request {} failed", id);
/// registry.close_logs();
/// ```
pub struct LogRegistry {
    entries: Entries,
    flusher: BackgroundFlusher,
    registration: Mutex<()>,
    level_mask: AtomicU8,
}

impl Default for LogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LogRegistry {
    /// Empty registry with the default flusher timing. The flusher is not started.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FlusherConfig::default())
    }

    #[must_use]
    pub fn with_config(config: FlusherConfig) -> Self {
        let entries: Entries = Arc::new(RwLock::new(Vec::new()));
        Self {
            flusher: BackgroundFlusher::new(Arc::clone(&entries), config),
            entries,
            registration: Mutex::new(()),
            level_mask: AtomicU8::new(LevelMask::ALL.bits()),
        }
    }

    /// Builds a registry from a [`Config`]: flusher timing and `max_level` from
    /// `[Logging]`, and one destination per `[log.<name>]` section.
    ///
    /// # Errors
    /// Returns the first configuration or registration error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Self::with_config(FlusherConfig::from_config(config)?);
        if let Some(mask) = config.level_mask()? {
            registry.set_level_mask(mask);
        }
        registry.register_from_config(config)?;
        Ok(registry)
    }

    /// Registers every `[log.<name>]` section, in section-name order.
    ///
    /// # Errors
    /// Stops at the first malformed section or duplicate path; destinations
    /// registered before it stay registered.
    pub fn register_from_config(&self, config: &Config) -> Result<Vec<usize>> {
        config
            .log_specs()?
            .into_iter()
            .map(|spec| self.register_new_log(&spec.path, spec.options))
            .collect()
    }

    /// Registers a file destination.
    ///
    /// The file is opened lazily, on the first drain that has text for it.
    ///
    /// # Errors
    /// [`LogError::EmptyName`] for an empty path, [`LogError::DuplicateName`]
    /// when the path is already registered. The registry is unchanged on error.
    pub fn register_new_log<P: AsRef<Path>>(&self, path: P, options: LogOptions) -> Result<usize> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(LogError::EmptyName);
        }
        self.register_sink(FileSink::new(path, options.append), options)
    }

    /// Registers any [`LogSink`]. `options.append` is left to the sink.
    ///
    /// # Errors
    /// Same as [`register_new_log`](Self::register_new_log), keyed on the sink's
    /// path when it has one and on its name otherwise.
    pub fn register_sink<S: LogSink + 'static>(&self, sink: S, options: LogOptions) -> Result<usize> {
        if sink.name().is_empty() {
            return Err(LogError::EmptyName);
        }

        let _registering = self.registration.lock();
        let was_running = self.flusher.stop();
        let result = self.append_entry(Box::new(sink), options);
        if was_running {
            self.flusher.start();
        }

        match &result {
            Ok(index) => tracing::debug!(index, "registered log destination"),
            Err(e) => tracing::warn!(error = %e, "log registration rejected"),
        }
        result
    }

    fn append_entry(&self, sink: Box<dyn LogSink>, options: LogOptions) -> Result<usize> {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.same_destination(&*sink)) {
            return Err(LogError::DuplicateName(sink.name().to_string()));
        }
        let index = entries.len();
        entries.push(Arc::new(LogEntry::new(index, sink, options)));
        Ok(index)
    }

    fn entry(&self, index: usize) -> Option<Arc<LogEntry>> {
        self.entries.read().get(index).cloned()
    }

    /// Opens a session writing to entry `index` at `level`.
    ///
    /// Callers are expected to check [`enabled`](Self::enabled) (or
    /// [`macro_check`](Self::macro_check)) first; the `logfile!` macro does.
    /// The level is not re-checked here. An invalid index yields a detached
    /// session whose text is dropped.
    ///
    /// While this thread holds the entry's [`EntryGuard`], the line is staged
    /// with the guard's lines and published when the guard is released.
    ///
    /// For a thread-safe entry the session holds the entry lock until it is
    /// dropped, so do not keep one open across a call that needs that lock
    /// (another `get` on the same entry from this thread, `lock`, `flush`,
    /// registration or `close_logs`). Do not call into the registry at all
    /// while holding one, not even for another entry: a pending registration
    /// or `close_logs` queues for the entry list, `flush` on another thread
    /// waits for the held entry, and the nested call then waits behind both.
    pub fn get(&self, index: usize, level: LogLevel) -> Session<'_> {
        match self.entry(index) {
            Some(entry) => entry.session(level),
            None => Session::detached(),
        }
    }

    /// True if `index` is registered and `level` is within its threshold.
    #[must_use]
    pub fn macro_check(&self, index: usize, level: LogLevel) -> bool {
        self.entries
            .read()
            .get(index)
            .is_some_and(|e| e.accepts(level))
    }

    /// [`macro_check`](Self::macro_check) combined with the global level mask.
    #[must_use]
    pub fn enabled(&self, index: usize, level: LogLevel) -> bool {
        self.level_mask().contains(level) && self.macro_check(index, level)
    }

    #[must_use]
    pub fn check_index(&self, index: usize) -> bool {
        index < self.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn name(&self, index: usize) -> Option<String> {
        self.entry(index).map(|e| e.name().to_string())
    }

    #[must_use]
    pub fn is_thread_safe(&self, index: usize) -> Option<bool> {
        self.entry(index).map(|e| e.is_thread_safe())
    }

    #[must_use]
    pub fn reporting_level(&self, index: usize) -> Option<LogLevel> {
        self.entry(index).map(|e| e.threshold())
    }

    /// # Errors
    /// [`LogError::InvalidIndex`] when nothing is registered at `index`.
    pub fn set_reporting_level(&self, index: usize, level: LogLevel) -> Result<()> {
        let entry = self.entry(index).ok_or(LogError::InvalidIndex(index))?;
        entry.set_threshold(level);
        Ok(())
    }

    /// Effective global mask: the compiled-in levels intersected with the one
    /// set through [`set_level_mask`](Self::set_level_mask).
    #[must_use]
    pub fn level_mask(&self) -> LevelMask {
        LevelMask::from_bits(self.level_mask.load(Ordering::Relaxed)).intersect(LOG_MAX_LEVEL)
    }

    pub fn set_level_mask(&self, mask: LevelMask) {
        self.level_mask.store(mask.bits(), Ordering::Relaxed);
    }

    /// Locks entry `index` so several lines can be written as one unit.
    ///
    /// Lines written from this thread to the same entry until the guard is
    /// released, through the guard or through [`get`](Self::get) and
    /// `logfile!`, land together and in order. Releasing the returned guard
    /// unlocks. `None` for an invalid index.
    #[must_use]
    pub fn lock(&self, index: usize) -> Option<EntryGuard<'_>> {
        self.entry(index)
            .map(EntryGuard::new)
    }

    /// Drains every entry now, on the calling thread.
    pub fn flush(&self) -> DrainReport {
        drain_all(&self.entries)
    }

    /// See [`BackgroundFlusher::start`].
    pub fn start(&self) -> bool {
        self.flusher.start()
    }

    /// See [`BackgroundFlusher::stop`].
    pub fn stop(&self) -> bool {
        self.flusher.stop()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flusher.is_running()
    }

    #[must_use]
    pub fn write_interval(&self) -> Duration {
        self.flusher.write_interval()
    }

    pub fn set_write_interval(&self, interval: Duration) {
        self.flusher.set_write_interval(interval);
    }

    #[must_use]
    pub fn start_delay(&self) -> Duration {
        self.flusher.start_delay()
    }

    pub fn set_start_delay(&self, delay: Duration) {
        self.flusher.set_start_delay(delay);
    }

    /// Stops the flusher, drains and closes every sink, and empties the registry.
    ///
    /// Safe to call more than once; later calls find nothing to close. New
    /// registrations after this start again from index 0.
    pub fn close_logs(&self) {
        let _registering = self.registration.lock();
        self.flusher.stop();

        let mut entries = self.entries.write();
        for entry in entries.drain(..) {
            if let Err(e) = entry.close() {
                tracing::warn!(index = entry.index(), name = entry.name(), error = %e, "closing log failed");
            }
        }
    }
}

impl Drop for LogRegistry {
    fn drop(&mut self) {
        self.close_logs();
    }
}
