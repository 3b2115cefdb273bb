//! Periodic fetch loop

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::fetch::{FetchOutcome, ScreenFetcher};

/// Counters kept by the stream loop
#[derive(Debug, Default)]
pub struct StreamStats {
    ticks: AtomicU64,
    frames_ok: AtomicU64,
    frames_failed: AtomicU64,
    skipped: AtomicU64,
    active_loops: AtomicUsize,
}

/// Point-in-time copy of [`StreamStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStatsSnapshot {
    pub ticks: u64,
    pub frames_ok: u64,
    pub frames_failed: u64,
    pub skipped: u64,
    pub active_loops: usize,
}

impl StreamStats {
    fn record(&self, outcome: FetchOutcome) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            FetchOutcome::Decoded => &self.frames_ok,
            FetchOutcome::Skipped | FetchOutcome::Stale => &self.skipped,
            FetchOutcome::Invalid | FetchOutcome::DecodeFailed | FetchOutcome::TransportFailed => {
                &self.frames_failed
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_ok: self.frames_ok.load(Ordering::Relaxed),
            frames_failed: self.frames_failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            active_loops: self.active_loops.load(Ordering::SeqCst),
        }
    }
}

/// Counts a running loop for as long as its future is alive
struct ActiveLoop(Arc<StreamStats>);

impl ActiveLoop {
    fn enter(stats: Arc<StreamStats>) -> Self {
        stats.active_loops.fetch_add(1, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for ActiveLoop {
    fn drop(&mut self) {
        self.0.active_loops.fetch_sub(1, Ordering::SeqCst);
    }
}

struct StreamHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owner of at most one running fetch loop
pub struct ScreenStream {
    fetcher: Arc<ScreenFetcher>,
    interval: Duration,
    handle: Mutex<Option<StreamHandle>>,
    stats: Arc<StreamStats>,
}

impl ScreenStream {
    pub fn new(fetcher: Arc<ScreenFetcher>, interval: Duration) -> Self {
        Self {
            fetcher,
            interval,
            handle: Mutex::new(None),
            stats: Arc::new(StreamStats::default()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the loop. Returns `false` if one is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut handle = self.handle.lock();
        if let Some(running) = handle.as_ref() {
            if !running.task.is_finished() {
                return false;
            }
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.fetcher),
            self.interval,
            cancel.clone(),
            Arc::clone(&self.stats),
        ));
        *handle = Some(StreamHandle { cancel, task });
        tracing::info!("Screen stream started ({:?} interval)", self.interval);
        true
    }

    /// Stop the loop. Returns `false` if none was running.
    ///
    /// The wait and any in-flight fetch are abandoned immediately.
    pub fn stop(&self) -> bool {
        let Some(running) = self.handle.lock().take() else {
            return false;
        };
        running.cancel.cancel();
        running.task.abort();
        tracing::info!("Screen stream stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|running| !running.task.is_finished())
            .unwrap_or(false)
    }

    pub fn stats(&self) -> StreamStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for ScreenStream {
    fn drop(&mut self) {
        if let Some(running) = self.handle.get_mut().take() {
            running.cancel.cancel();
            running.task.abort();
        }
    }
}

async fn run_loop(
    fetcher: Arc<ScreenFetcher>,
    interval: Duration,
    cancel: CancellationToken,
    stats: Arc<StreamStats>,
) {
    let _active = ActiveLoop::enter(Arc::clone(&stats));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = fetcher.fetch() => stats.record(outcome),
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::debug!("Screen stream loop exited");
}
