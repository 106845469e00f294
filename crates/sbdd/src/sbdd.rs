//! The disk and its lifecycle.
use std::fmt;

use crate::device::DeviceState;
use crate::prelude::*;
use crate::stack::{DiskHandle, DiskInfo, StorageStack};
use crate::transfer::transfer;
use crate::SbddConfig;

/// The lifecycle of a disk.
///
/// ```text
/// Uninitialized --create--> Active --delete--> Draining --> Destroyed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// The backing store exists but the disk is not registered yet.
    Uninitialized = 0,
    /// The disk is registered and serves requests.
    Active = 1,
    /// New requests are rejected; waiting for in-flight ones to finish.
    Draining = 2,
    /// The disk is unregistered and its backing store released.
    Destroyed = 3,
}

impl LifecycleState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Active,
            2 => Self::Draining,
            _ => Self::Destroyed,
        }
    }
}

/// The I/O side of a disk, i.e., what is registered with the host stack.
///
/// It may outlive the `Sbdd` that created it, e.g., when the host stack keeps
/// a reference. After the disk is deleted, every request submitted to it is
/// completed with `EIO`.
pub struct SbddDisk {
    name: String,
    state: DeviceState,
}

impl SbddDisk {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state.lifecycle()
    }

    /// Returns the number of references held on the disk: one per request
    /// in flight, plus one while the disk is not being deleted.
    pub fn active_ops(&self) -> usize {
        self.state.active_ops()
    }

    /// Apply the segments of an admitted request in order.
    fn do_transfer(&self, req: &BioReq) {
        let dir = req.type_();
        let mut pos = req.addr();
        req.access_mut_segments_with(|segments| {
            for seg in segments.iter_mut() {
                pos += transfer(&self.state, seg, pos, dir);
            }
        });
    }
}

impl BlockDevice for SbddDisk {
    fn total_sectors(&self) -> Sector {
        self.state.capacity()
    }

    fn submit(&self, req: Arc<BioReq>) -> BioSubmission {
        // Update the status of req to submitted
        let submission = BioSubmission::new(req);
        let req = submission.req();

        let Some(op) = self.state.try_get() else {
            warn!("{}: request {} rejected, disk is being deleted", self.name, req.id());
            req.complete(Err(EIO));
            return submission;
        };

        self.do_transfer(req);

        // Update the status of req to completed and set the response. The
        // reference is released only after the completion.
        req.complete(Ok(()));
        drop(op);

        submission
    }
}

impl fmt::Debug for SbddDisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SbddDisk")
            .field("name", &self.name)
            .field("capacity", &self.state.capacity())
            .field("lifecycle_state", &self.lifecycle_state())
            .field("active_ops", &self.active_ops())
            .finish()
    }
}

/// A simple block device.
///
/// `Sbdd` owns a disk from its creation to its deletion. The disk is
/// reachable by the host stack in between. Dropping an `Sbdd` deletes the
/// disk if `delete` was not called.
pub struct Sbdd {
    disk: Arc<SbddDisk>,
    stack: Arc<dyn StorageStack>,
    handle: Option<DiskHandle>,
}

impl Sbdd {
    /// Create a disk and register it with the host stack.
    ///
    /// Fails with `EINVAL` for an invalid configuration, `ENOMEM` if the
    /// backing store cannot be allocated, and with the error of the host stack
    /// if the registration is refused. Nothing is left registered or
    /// allocated on failure.
    pub fn create(config: &SbddConfig, stack: Arc<dyn StorageStack>) -> Result<Self> {
        config.validate()?;
        let capacity = config.capacity_sectors()?;

        info!("{}: allocating data", config.name);
        let state = DeviceState::new(capacity).map_err(|e| {
            error!("{}: unable to alloc data", config.name);
            e
        })?;

        let disk = Arc::new(SbddDisk {
            name: config.name.clone(),
            state,
        });
        let mut sbdd = Self {
            disk,
            stack,
            handle: None,
        };

        // After the registration, requests may arrive at any time.
        info!("{}: adding disk", config.name);
        let info = DiskInfo {
            name: config.name.clone(),
            capacity,
            logical_block_size: SECTOR_SIZE,
            physical_block_size: SECTOR_SIZE,
        };
        let handler: Arc<dyn BlockDevice> = sbdd.disk.clone();
        match sbdd.stack.register_device(info, handler) {
            Ok(handle) => {
                sbdd.handle = Some(handle);
                sbdd.disk.state.set_lifecycle(LifecycleState::Active);
                info!("{}: initialization complete", config.name);
                Ok(sbdd)
            }
            Err(e) => {
                error!("{}: add_disk failed: {}", config.name, e);
                // Dropping the half-built disk drains it and frees the store
                drop(sbdd);
                Err(e.cause_err(|e| errno!(e.errno(), "unable to register the disk")))
            }
        }
    }

    /// Delete the disk.
    ///
    /// New requests are rejected from now on. The call blocks until all
    /// requests in flight are complete, then unregisters the disk and
    /// releases the backing store. Deleting a deleted disk does nothing.
    pub fn delete(&mut self) {
        let state = &self.disk.state;
        if state.lifecycle() == LifecycleState::Destroyed {
            return;
        }

        state.set_deleting();
        state.set_lifecycle(LifecycleState::Draining);
        // Drop the reference taken at creation
        state.put();
        state.wait_drained();

        // The disk is removed only after the last reference is put
        if let Some(handle) = self.handle.take() {
            info!("{}: deleting disk", self.disk.name);
            self.stack.unregister_device(handle);
        }

        if state.free_store() {
            info!("{}: freeing data", self.disk.name);
        }
        state.set_lifecycle(LifecycleState::Destroyed);
    }

    pub fn name(&self) -> &str {
        self.disk.name()
    }

    /// Returns the capacity in sectors.
    pub fn capacity(&self) -> Sector {
        self.disk.total_sectors()
    }

    pub fn state(&self) -> LifecycleState {
        self.disk.lifecycle_state()
    }

    /// Returns the I/O handler of the disk, the same one the host stack got.
    pub fn disk(&self) -> Arc<SbddDisk> {
        self.disk.clone()
    }
}

impl Drop for Sbdd {
    fn drop(&mut self) {
        self.delete();
    }
}

impl fmt::Debug for Sbdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sbdd")
            .field("disk", &self.disk)
            .field("handle", &self.handle)
            .finish()
    }
}
