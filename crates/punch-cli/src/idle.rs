//! Inactivity detection.
//!
//! [`IdleMonitor`] watches the gap since the last `touch()` and fires an
//! idle callback once it exceeds the timeout; the next `touch()` fires a
//! resume callback. It knows nothing about tracking — the callbacks feed
//! the session's `idle_detected` / `activity_resumed` entry points, which
//! tolerate duplicated or out-of-order signals.
//!
//! A large gap between two poll ticks means the machine was asleep; if the
//! gap exceeds the timeout it is treated as idle time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Gap between poll ticks beyond which the machine is assumed to have
/// been asleep.
const SLEEP_GAP: Duration = Duration::from_secs(5);

type Callback = Box<dyn Fn() + Send + Sync>;

struct MonitorState {
    last_activity: Instant,
    idle: bool,
}

struct Shared {
    state: Mutex<MonitorState>,
    timeout: Duration,
    on_idle: Callback,
    on_resume: Callback,
    running: AtomicBool,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background idle watcher.
pub struct IdleMonitor {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl IdleMonitor {
    /// Spawns the monitor thread.
    ///
    /// `on_idle` fires once when the timeout elapses with no activity;
    /// `on_resume` fires on the first `touch()` after that. Callbacks run
    /// on the monitor thread (idle) or the toucher's thread (resume) and
    /// should be quick.
    pub fn spawn(
        timeout: Duration,
        poll_interval: Duration,
        on_idle: impl Fn() + Send + Sync + 'static,
        on_resume: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(MonitorState {
                last_activity: Instant::now(),
                idle: false,
            }),
            timeout,
            on_idle: Box::new(on_idle),
            on_resume: Box::new(on_resume),
            running: AtomicBool::new(true),
        });

        let handle = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || run_loop(&shared, poll_interval))
        };

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Records user activity.
    ///
    /// Resets the idle countdown; if the monitor had gone idle, fires the
    /// resume callback before returning.
    pub fn touch(&self) {
        let was_idle = {
            let mut state = self.shared.lock();
            let was_idle = state.idle;
            state.last_activity = Instant::now();
            state.idle = false;
            was_idle
        };
        if was_idle {
            (self.shared.on_resume)();
        }
    }

    /// Stops the monitor thread and waits for it to finish.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for IdleMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(shared: &Shared, poll_interval: Duration) {
    let mut last_tick = Instant::now();

    while shared.running.load(Ordering::SeqCst) {
        std::thread::sleep(poll_interval);

        let now = Instant::now();
        let tick_gap = now - last_tick;
        last_tick = now;

        let fire = {
            let mut state = shared.lock();
            if state.idle {
                false
            } else if tick_gap > SLEEP_GAP.max(poll_interval * 4) && tick_gap >= shared.timeout {
                // Woke from sleep after longer than the timeout.
                tracing::debug!(gap_secs = tick_gap.as_secs(), "sleep gap treated as idle");
                state.idle = true;
                true
            } else if now - state.last_activity >= shared.timeout {
                state.idle = true;
                true
            } else {
                false
            }
        };
        if fire {
            (shared.on_idle)();
        }
    }
}
