//! The host storage stack that disks register with.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::prelude::*;

/// The longest disk name a host stack accepts.
pub const DISK_NAME_LEN: usize = 32;

/// What a host stack needs to know about a disk to expose it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskInfo {
    pub name: String,
    /// The capacity in sectors.
    pub capacity: Sector,
    pub logical_block_size: usize,
    pub physical_block_size: usize,
}

/// A registration of a disk with a host stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiskHandle(u64);

impl DiskHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// A host storage stack.
///
/// Once `register_device` returns, the stack may call `handler.submit` at any
/// time and from any thread, until `unregister_device` is called for the
/// returned handle.
pub trait StorageStack: Send + Sync {
    fn register_device(&self, info: DiskInfo, handler: Arc<dyn BlockDevice>)
        -> Result<DiskHandle>;

    fn unregister_device(&self, handle: DiskHandle);
}

/// A storage stack living in the current process.
///
/// Disks are looked up by name with `open`. Each name can be registered once.
pub struct LocalStack {
    next_handle: AtomicU64,
    disks: Mutex<BTreeMap<DiskHandle, Registered>>,
}

struct Registered {
    info: DiskInfo,
    handler: Arc<dyn BlockDevice>,
}

impl LocalStack {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            disks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the I/O handler of a registered disk.
    pub fn open(&self, name: &str) -> Option<Arc<dyn BlockDevice>> {
        self.disks
            .lock()
            .values()
            .find(|disk| disk.info.name == name)
            .map(|disk| disk.handler.clone())
    }

    /// Returns the information of all registered disks.
    pub fn disks(&self) -> Vec<DiskInfo> {
        self.disks
            .lock()
            .values()
            .map(|disk| disk.info.clone())
            .collect()
    }
}

impl Default for LocalStack {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageStack for LocalStack {
    fn register_device(
        &self,
        info: DiskInfo,
        handler: Arc<dyn BlockDevice>,
    ) -> Result<DiskHandle> {
        if info.name.is_empty() || info.name.len() > DISK_NAME_LEN {
            return_errno!(EINVAL, "invalid disk name");
        }
        if info.logical_block_size == 0 || info.physical_block_size < info.logical_block_size {
            return_errno!(EINVAL, "invalid block sizes");
        }

        let mut disks = self.disks.lock();
        if disks.values().any(|disk| disk.info.name == info.name) {
            return_errno!(EEXIST, "a disk of the same name exists");
        }
        let handle = DiskHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        info!(
            "disk {} registered: {} sectors of {} bytes",
            info.name, info.capacity, info.logical_block_size
        );
        disks.insert(handle, Registered { info, handler });
        Ok(handle)
    }

    fn unregister_device(&self, handle: DiskHandle) {
        match self.disks.lock().remove(&handle) {
            Some(disk) => info!("disk {} unregistered", disk.info.name),
            None => warn!("unregistering an unknown disk handle {}", handle.get()),
        }
    }
}

impl fmt::Debug for LocalStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStack")
            .field("disks", &self.disks())
            .finish()
    }
}
