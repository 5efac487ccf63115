use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Per-engine shutdown flag.
///
/// The flag is only read or written under its mutex. The condition variable
/// lets workers sleep between retries and still wake as soon as `stop` runs.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    requested: Mutex<bool>,
    changed: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        *self.requested.lock() = true;
        self.changed.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.requested.lock()
    }

    /// Sleeps for up to `timeout`, returning early once shutdown is triggered.
    /// Returns whether shutdown has been triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut requested = self.requested.lock();
        while !*requested {
            if self.changed.wait_until(&mut requested, deadline).timed_out() {
                break;
            }
        }
        *requested
    }
}
