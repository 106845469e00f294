//! The state shared by a disk's lifecycle manager and its I/O path.
use std::sync::atomic::{AtomicU8, Ordering};

use crate::prelude::*;
use crate::sbdd::LifecycleState;
use crate::util::{DrainSignal, OpsCount};

/// The backing store and the admission state of a disk.
///
/// Locking rules:
/// * `store` is read or written only under its lock, one transfer at a time.
/// * `active_ops` starts at one, the reference of the lifecycle manager. Every
///   admitted request holds one more until it completes.
/// * The deleting flag is the closed bit of `active_ops`. It only goes from
///   clear to set, and once it is set the count never increases again.
pub(crate) struct DeviceState {
    capacity: Sector,
    // A spin lock: held for a single segment copy only, never across a
    // request. Waiters burn CPU while the holder is preempted.
    store: Mutex<Option<Box<[u8]>>>,
    active_ops: OpsCount,
    drain: DrainSignal,
    lifecycle: AtomicU8,
}

impl DeviceState {
    /// Allocate a zeroed backing store of `capacity` sectors.
    pub fn new(capacity: Sector) -> Result<Self> {
        let store = alloc_store(crate::sector::to_bytes(capacity))?;
        Ok(Self {
            capacity,
            store: Mutex::new(Some(store)),
            active_ops: OpsCount::new(1),
            drain: DrainSignal::new(),
            lifecycle: AtomicU8::new(LifecycleState::Uninitialized as u8),
        })
    }

    pub fn capacity(&self) -> Sector {
        self.capacity
    }

    pub fn is_deleting(&self) -> bool {
        self.active_ops.is_closed()
    }

    pub fn set_deleting(&self) {
        self.active_ops.close();
    }

    /// Admit a new operation.
    ///
    /// Returns `None` if the disk is being deleted or has drained already.
    /// The operation stays in flight until the returned guard is dropped.
    pub fn try_get(&self) -> Option<OpGuard<'_>> {
        if self.is_deleting() {
            return None;
        }
        // Checks the flag again, atomically with the increment
        if !self.active_ops.inc_not_zero() {
            return None;
        }
        Some(OpGuard { state: self })
    }

    /// Release one reference, waking up the drainer on the last one.
    pub fn put(&self) {
        if self.active_ops.dec_and_test() {
            self.drain.notify();
        }
    }

    /// Block until every reference has been released.
    pub fn wait_drained(&self) {
        self.drain.wait_until(|| self.active_ops.get() == 0);
    }

    pub fn active_ops(&self) -> usize {
        self.active_ops.get()
    }

    pub fn lock_store(&self) -> MutexGuard<'_, Option<Box<[u8]>>> {
        self.store.lock()
    }

    /// Release the backing store.
    ///
    /// Returns false if it was released before.
    pub fn free_store(&self) -> bool {
        let store = self.store.lock().take();
        store.is_some()
    }

    #[cfg(test)]
    pub fn has_store(&self) -> bool {
        self.store.lock().is_some()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        LifecycleState::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    pub fn set_lifecycle(&self, new_state: LifecycleState) {
        self.lifecycle.store(new_state as u8, Ordering::Release);
    }
}

/// An admitted operation. Dropping it releases the reference it holds.
pub(crate) struct OpGuard<'a> {
    state: &'a DeviceState,
}

impl<'a> Drop for OpGuard<'a> {
    fn drop(&mut self) {
        self.state.put();
    }
}

fn alloc_store(nbytes: usize) -> Result<Box<[u8]>> {
    let mut store = Vec::new();
    store
        .try_reserve_exact(nbytes)
        .map_err(Error::from)
        .cause_err(|e| errno!(e.errno(), "unable to alloc data"))?;
    store.resize(nbytes, 0);
    Ok(store.into_boxed_slice())
}
