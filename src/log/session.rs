use std::{
    fmt::{self, Write as _},
    marker::PhantomData,
    sync::Arc,
};

use parking_lot::Mutex;

use crate::log::{
    log_entry::{EntryState, StateGuard},
    log_level::LogLevel,
    timestamp::now_time,
};

enum Binding<'a> {
    /// Thread-safe entry: the lock was taken at construction and is held until drop.
    Held(StateGuard),
    /// The lock is only taken to merge on drop.
    Deferred(Arc<Mutex<EntryState>>),
    /// Composed through an `EntryGuard`; staged until the guard is released.
    Grouped(&'a Mutex<String>),
    /// Opened with `get` by the thread holding the entry's `EntryGuard`.
    Staged(Arc<Mutex<String>>),
    /// Nothing to write to; text is discarded.
    Detached,
}

/// Short-lived writer composing one log line.
///
/// Text accumulates in the session's own buffer and is merged, as one whole
/// newline-terminated line, into the entry's buffer when the session is
/// dropped. Concurrent sessions therefore never interleave inside a line.
///
/// A session is tied to the registry (or guard) that produced it and cannot be
/// sent to another thread. Keep it to the statement or block that writes the line.
///
/// ```rust,ignore
/// let mut s = registry.get(idx, LogLevel::Error);
/// write!(s, "request {id} failed: {err}")?;
/// // merged here
/// ```
#[must_use = "a session merges its text when dropped; bind it to write more than the header"]
pub struct Session<'a> {
    binding: Binding<'a>,
    text: String,
    _not_send: PhantomData<*const ()>,
}

impl<'a> Session<'a> {
    fn with_header(binding: Binding<'a>, level: LogLevel) -> Self {
        let mut text = String::with_capacity(64);
        let _ = write!(text, " - {} - {}: ", now_time(), level.label());
        Self {
            binding,
            text,
            _not_send: PhantomData,
        }
    }

    pub(crate) fn held(guard: StateGuard, level: LogLevel) -> Self {
        Self::with_header(Binding::Held(guard), level)
    }

    pub(crate) fn deferred(state: Arc<Mutex<EntryState>>, level: LogLevel) -> Self {
        Self::with_header(Binding::Deferred(state), level)
    }

    pub(crate) fn grouped(staged: &'a Mutex<String>, level: LogLevel) -> Self {
        Self::with_header(Binding::Grouped(staged), level)
    }

    pub(crate) fn staged(staged: Arc<Mutex<String>>, level: LogLevel) -> Self {
        Self::with_header(Binding::Staged(staged), level)
    }

    pub(crate) fn detached() -> Self {
        Self {
            binding: Binding::Detached,
            text: String::new(),
            _not_send: PhantomData,
        }
    }

    /// Appends the display form of `value`.
    pub fn append(&mut self, value: impl fmt::Display) -> &mut Self {
        let _ = write!(self.text, "{value}");
        self
    }

    /// The line composed so far, header included.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the session is not bound to any entry.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        matches!(self.binding, Binding::Detached)
    }

    /// True while its entry's lock is held for this session, by the session
    /// itself or by the guard it was opened under.
    #[must_use]
    pub fn holds_lock(&self) -> bool {
        matches!(
            self.binding,
            Binding::Held(_) | Binding::Grouped(_) | Binding::Staged(_)
        )
    }

    /// Ends the session now, merging its text.
    pub fn end(self) {}
}

impl fmt::Write for Session<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.text.push_str(s);
        Ok(())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.is_detached() {
            return;
        }
        self.text.push('\n');
        match &mut self.binding {
            Binding::Held(guard) => guard.buffer.push_str(&self.text),
            Binding::Deferred(state) => state.lock().buffer.push_str(&self.text),
            Binding::Grouped(staged) => staged.lock().push_str(&self.text),
            Binding::Staged(staged) => staged.lock().push_str(&self.text),
            Binding::Detached => {}
        }
        // A held guard is released right after this, when the field drops.
    }
}
