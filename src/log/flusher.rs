use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::{Mutex, RwLock};

use crate::{config::FlusherConfig, log::log_entry::LogEntry};

/// The registry's entry sequence, shared with the flusher thread.
pub(crate) type Entries = Arc<RwLock<Vec<Arc<LogEntry>>>>;

/// Outcome of one drain pass over every entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries visited.
    pub entries: usize,
    /// Bytes moved into sinks.
    pub bytes: usize,
    /// Entries whose sink failed during this pass.
    pub failures: usize,
}

/// Drains every entry in registration order.
///
/// A failing sink is reported and skipped; it never stops the pass.
pub(crate) fn drain_all(entries: &RwLock<Vec<Arc<LogEntry>>>) -> DrainReport {
    let entries = entries.read();
    let mut report = DrainReport::default();
    for entry in entries.iter() {
        report.entries += 1;
        match entry.drain() {
            Ok(n) => report.bytes += n,
            Err(e) => {
                report.failures += 1;
                tracing::warn!(index = entry.index(), name = entry.name(), error = %e, "log drain failed");
            }
        }
    }
    report
}

struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Background task that periodically moves buffered text into the sinks.
///
/// `Stopped -> Running -> Stopped`. While running it drains every entry, then
/// waits one write interval; a stop request wakes it early, and it drains once
/// more before exiting so nothing merged before `stop` returns is left behind.
pub struct BackgroundFlusher {
    entries: Entries,
    write_interval_ms: Arc<AtomicU64>,
    start_delay_ms: AtomicU64,
    worker: Mutex<Option<Worker>>,
}

impl BackgroundFlusher {
    pub(crate) fn new(entries: Entries, config: FlusherConfig) -> Self {
        Self {
            entries,
            write_interval_ms: Arc::new(AtomicU64::new(duration_ms(config.write_interval))),
            start_delay_ms: AtomicU64::new(duration_ms(config.start_delay)),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the flush thread, then blocks for the start delay.
    ///
    /// Returns `false` if it was already running or the thread could not be spawned.
    pub fn start(&self) -> bool {
        {
            let mut worker = self.worker.lock();
            if worker.is_some() {
                return false;
            }

            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            let entries = Arc::clone(&self.entries);
            let interval = Arc::clone(&self.write_interval_ms);

            let spawned = thread::Builder::new()
                .name("logtools-flusher".into())
                .spawn(move || run(&entries, &interval, &stop_rx));

            match spawned {
                Ok(handle) => *worker = Some(Worker { stop_tx, handle }),
                Err(e) => {
                    tracing::error!(error = %e, "could not spawn log flusher");
                    return false;
                }
            }
        }

        tracing::debug!("log flusher started");
        thread::sleep(self.start_delay());
        true
    }

    /// Signals the flush thread and waits for its final drain.
    ///
    /// Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let Some(worker) = self.worker.lock().take() else {
            return false;
        };
        // A closed channel also ends the loop, so the send result does not matter.
        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            tracing::error!("log flusher panicked");
        }
        tracing::debug!("log flusher stopped");
        true
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    #[must_use]
    pub fn write_interval(&self) -> Duration {
        Duration::from_millis(self.write_interval_ms.load(Ordering::Relaxed))
    }

    /// Takes effect from the next wait, including on a running flusher.
    pub fn set_write_interval(&self, interval: Duration) {
        self.write_interval_ms
            .store(duration_ms(interval), Ordering::Relaxed);
    }

    #[must_use]
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms.load(Ordering::Relaxed))
    }

    pub fn set_start_delay(&self, delay: Duration) {
        self.start_delay_ms.store(duration_ms(delay), Ordering::Relaxed);
    }
}

impl Drop for BackgroundFlusher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(entries: &RwLock<Vec<Arc<LogEntry>>>, interval: &AtomicU64, stop_rx: &mpsc::Receiver<()>) {
    loop {
        drain_all(entries);
        let wait = Duration::from_millis(interval.load(Ordering::Relaxed));
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    // Covers whatever was merged since the last pass.
    drain_all(entries);
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
