//! Transmit-pending signal for hosted targets.
//!
//! Same single-setter, single-clearer discipline as the bare-metal atomic
//! flag, but `wait` parks the dispatch thread on a condition variable instead
//! of spinning.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use canfd_node::PendingSignal;

#[derive(Debug, Default)]
pub struct BlockingSignal {
    pending: Mutex<bool>,
    raised: Condvar,
}

impl BlockingSignal {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(false),
            raised: Condvar::new(),
        }
    }

    /// Like [`PendingSignal::wait`], giving up after `timeout`.
    ///
    /// Returns whether the signal is pending.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let pending = self.lock();
        let (pending, _) = self
            .raised
            .wait_timeout_while(pending, timeout, |pending| !*pending)
            .unwrap_or_else(PoisonError::into_inner);
        *pending
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PendingSignal for BlockingSignal {
    fn raise(&self) {
        *self.lock() = true;
        self.raised.notify_one();
    }

    fn is_pending(&self) -> bool {
        *self.lock()
    }

    fn clear(&self) {
        *self.lock() = false;
    }

    fn wait(&self) {
        let pending = self.lock();
        let _pending = self
            .raised
            .wait_while(pending, |pending| !*pending)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
