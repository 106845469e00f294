use std::sync::{Condvar, Mutex, PoisonError};

/// A wait queue with at most one waiter.
///
/// The waiter sleeps until a condition it gives holds; whoever makes the
/// condition true calls `notify` afterwards. Checking the condition and going
/// to sleep happen under the same lock that `notify` takes, so a notification
/// cannot slip in between them.
pub(crate) struct DrainSignal {
    lock: Mutex<()>,
    cond: Condvar,
}

impl DrainSignal {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Block the current thread until `cond` returns true.
    pub fn wait_until<F>(&self, mut cond: F)
    where
        F: FnMut() -> bool,
    {
        // The lock guards no data, so a poisoned lock is still usable.
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !cond() {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn notify(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.cond.notify_one();
    }
}
