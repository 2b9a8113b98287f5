// NetSleuth - app/scheduler.rs
//
// Timer-driven auto-refresh.
//
// A background thread ticks every `interval`. On each tick it asks the
// refresh trigger to start a cycle; if a cycle is still running the tick is
// skipped rather than queued, so slow collections never pile up.
//
// The sleep is split into REFRESH_CANCEL_CHECK_INTERVAL_MS slices so `stop`
// returns promptly even with multi-minute intervals.

use crate::app::refresh::RefreshHandle;
use crate::util::constants::REFRESH_CANCEL_CHECK_INTERVAL_MS;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Anything that can be asked to start a refresh cycle.
pub trait RefreshTrigger: Send + 'static {
    /// Returns `false` when the request was dropped because a cycle is running.
    fn try_start(&self) -> bool;
}

impl RefreshTrigger for RefreshHandle {
    fn try_start(&self) -> bool {
        RefreshHandle::try_start(self)
    }
}

/// Tick counters.
#[derive(Debug, Default)]
struct Counters {
    triggered: AtomicUsize,
    skipped: AtomicUsize,
}

/// Running auto-refresh timer. Stops when dropped.
pub struct AutoRefresh {
    interval: Duration,
    stop_flag: Arc<AtomicBool>,
    counters: Arc<Counters>,
    thread: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    /// Start ticking. The first tick fires one full `interval` from now.
    pub fn start<T: RefreshTrigger>(interval: Duration, trigger: T) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());

        let thread = {
            let stop_flag = Arc::clone(&stop_flag);
            let counters = Arc::clone(&counters);
            std::thread::Builder::new()
                .name("netsleuth-auto-refresh".to_string())
                .spawn(move || run_ticks(interval, trigger, stop_flag, counters))
        };

        let thread = match thread {
            Ok(handle) => {
                tracing::info!(interval_secs = interval.as_secs(), "Auto-refresh started");
                Some(handle)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to spawn auto-refresh thread");
                None
            }
        };

        Self {
            interval,
            stop_flag,
            counters,
            thread,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Ticks that started a cycle.
    pub fn triggered(&self) -> usize {
        self.counters.triggered.load(Ordering::SeqCst)
    }

    /// Ticks dropped because a cycle was already running.
    pub fn skipped(&self) -> usize {
        self.counters.skipped.load(Ordering::SeqCst)
    }

    /// Stop ticking and wait for the timer thread to exit.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
            tracing::info!(
                triggered = self.triggered(),
                skipped = self.skipped(),
                "Auto-refresh stopped"
            );
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_ticks<T: RefreshTrigger>(
    interval: Duration,
    trigger: T,
    stop_flag: Arc<AtomicBool>,
    counters: Arc<Counters>,
) {
    while sleep_unless_stopped(interval, &stop_flag) {
        if trigger.try_start() {
            counters.triggered.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("Auto-refresh triggered");
        } else {
            counters.skipped.fetch_add(1, Ordering::SeqCst);
            tracing::info!("Skipping auto-refresh, busy");
        }
    }
}

/// Sleep for `total` in small slices. Returns `false` if stopped meanwhile.
fn sleep_unless_stopped(total: Duration, stop_flag: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    let slice = Duration::from_millis(REFRESH_CANCEL_CHECK_INTERVAL_MS);
    loop {
        if stop_flag.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(slice.min(deadline - now));
    }
}
