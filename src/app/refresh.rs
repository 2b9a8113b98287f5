// NetSleuth - app/refresh.rs
//
// Refresh lifecycle management. Runs collect -> process on a background
// thread and hands the finished snapshot back over an mpsc channel.
//
// Architecture:
//   - `RefreshManager` lives with the application state and owns the
//     receiving end of a long-lived progress channel.
//   - `RefreshHandle` is a cheap clone given to anything that may request a
//     refresh (the CLI, the auto-refresh scheduler).
//   - A shared `Arc<AtomicBool>` busy flag allows at most one cycle in flight.
//     A request made while busy is dropped, not queued.
//   - The worker builds a brand-new `Arc<Vec<Entry>>` and sends it in a single
//     `Completed` message, so readers never observe a half-built snapshot.
//   - The busy flag is cleared by a drop guard, so a panicking worker cannot
//     wedge the pipeline in the busy state.

use crate::app::collector::CaptureSource;
use crate::core::model::RefreshProgress;
use crate::core::pipeline;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// Clears the busy flag when dropped.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Cloneable trigger for refresh cycles.
#[derive(Clone)]
pub struct RefreshHandle {
    source: Arc<dyn CaptureSource>,
    busy: Arc<AtomicBool>,
    tx: mpsc::Sender<RefreshProgress>,
}

impl RefreshHandle {
    /// Start a cycle unless one is already running.
    ///
    /// Returns `true` if a worker thread was started.
    pub fn try_start(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!("Refresh already in progress; request dropped");
            return false;
        }

        let guard = BusyGuard(Arc::clone(&self.busy));
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        let spawned = std::thread::Builder::new()
            .name("netsleuth-refresh".to_string())
            .spawn(move || run_refresh(source.as_ref(), tx, guard));

        match spawned {
            Ok(_) => {
                tracing::info!(source = %self.source.name(), "Refresh started");
                true
            }
            Err(e) => {
                // The closure (and its guard) was dropped, so busy is clear again.
                tracing::error!(error = %e, "Failed to spawn refresh thread");
                false
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Owns the progress channel for refresh cycles.
pub struct RefreshManager {
    progress_rx: mpsc::Receiver<RefreshProgress>,
    handle: RefreshHandle,
}

impl RefreshManager {
    pub fn new(source: Arc<dyn CaptureSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            progress_rx: rx,
            handle: RefreshHandle {
                source,
                busy: Arc::new(AtomicBool::new(false)),
                tx,
            },
        }
    }

    /// A trigger that can be moved to another thread.
    pub fn handle(&self) -> RefreshHandle {
        self.handle.clone()
    }

    /// Start a cycle unless one is already running.
    pub fn request_refresh(&self) -> bool {
        self.handle.try_start()
    }

    pub fn is_busy(&self) -> bool {
        self.handle.is_busy()
    }

    /// Poll for progress messages without blocking. Returns all pending messages.
    pub fn poll_progress(&self) -> Vec<RefreshProgress> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.progress_rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Block for the next progress message, up to `timeout`.
    pub fn wait_progress(&self, timeout: Duration) -> Option<RefreshProgress> {
        self.progress_rx.recv_timeout(timeout).ok()
    }
}

/// Background cycle: collect, process, publish.
fn run_refresh(
    source: &dyn CaptureSource,
    tx: mpsc::Sender<RefreshProgress>,
    guard: BusyGuard,
) {
    macro_rules! send {
        ($msg:expr) => {
            if tx.send($msg).is_err() {
                return; // Receiver dropped (application exiting); exit quietly.
            }
        };
    }

    send!(RefreshProgress::Started);
    let started = Instant::now();

    let capture = source.capture();
    if let Ok(ref c) = capture {
        send!(RefreshProgress::Collected {
            lines: c.lines.len(),
            exit_code: c.exit_code,
        });
    }

    let outcome = pipeline::build_outcome(capture, started);

    // Idle again before the result is visible, so a consumer reacting to
    // `Completed` can immediately start the next cycle.
    drop(guard);
    send!(RefreshProgress::Completed { outcome });
}
