//! Background sampler thread and its stop signal

use log::{debug, warn};
use std::sync::{Arc, Condvar, Mutex, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use super::rate::Shared;

/// Single-fire cancellation token
///
/// Once fired it stays fired, and any thread blocked in `wait_timeout`
/// wakes up immediately.
#[derive(Debug, Default)]
pub struct StopSignal {
    fired: Mutex<bool>,
    cvar: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal; later calls are no-ops
    pub fn fire(&self) {
        let mut fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        if !*fired {
            *fired = true;
            self.cvar.notify_all();
        }
    }

    pub fn is_fired(&self) -> bool {
        *self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`; returns true if the signal fired
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .cvar
            .wait_timeout_while(guard, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Start the sampler for `shared`
///
/// The thread only holds a weak reference, so it never keeps a tracker
/// alive on its own. Spawn failure is logged and the tracker keeps working
/// without periodic samples.
pub(super) fn spawn(shared: &Arc<Shared>) {
    let weak = Arc::downgrade(shared);
    let stop = shared.stop_signal();
    let interval = shared.interval();

    let result = thread::Builder::new()
        .name("rate-sampler".to_string())
        .spawn(move || run(weak, stop, interval));

    if let Err(e) = result {
        warn!("Failed to start rate sampler, speed will only be computed at finish: {e}");
    }
}

fn run(tracker: Weak<Shared>, stop: Arc<StopSignal>, interval: Duration) {
    debug!("Rate sampler started, interval {interval:?}");
    loop {
        match tracker.upgrade() {
            Some(shared) => shared.update(),
            None => break,
        }

        if stop.wait_timeout(interval) {
            break;
        }
    }
    debug!("Rate sampler stopped");
}
