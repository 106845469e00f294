//! A simple block device that keeps its data in memory.
//!
//! `Sbdd` emulates a disk of a fixed number of 512-byte sectors. A host
//! storage stack (see `StorageStack`) submits block I/O requests to it from
//! any number of threads; each request carries a direction, a starting
//! sector and an ordered list of buffer segments.
//!
//! The interesting part is teardown. Requests are admitted through an atomic
//! reference count that the device itself holds one reference of. Deleting the
//! device stops new admissions, drops that reference and waits for the count
//! to reach zero before the backing store is released. So the store is never
//! touched after it is freed, and never freed under a running request.
//!
//! # Usage example
//!
//! ```
//! use std::sync::Arc;
//! use sbdd::{BlockDeviceExt, LocalStack, Sbdd, SbddConfig, SECTOR_SIZE};
//!
//! let stack = Arc::new(LocalStack::new());
//! let config = SbddConfig::new("sbdd", 1);
//! let mut sbdd = Sbdd::create(&config, stack.clone()).unwrap();
//!
//! // The host stack reaches the disk through the registered handler
//! let disk = stack.open("sbdd").unwrap();
//! disk.write(0, &[0xAB; SECTOR_SIZE]).unwrap();
//! let mut buf = [0u8; SECTOR_SIZE];
//! disk.read(0, &mut buf).unwrap();
//! assert!(buf.iter().all(|b| *b == 0xAB));
//!
//! sbdd.delete();
//! ```

#[macro_use]
extern crate log;

pub mod bio;
pub mod block_device;
pub mod block_device_ext;
pub mod config;
mod device;
mod prelude;
mod sbdd;
pub mod sector;
pub mod segment;
pub mod stack;
mod transfer;
mod util;

pub const SECTOR_SHIFT: usize = 9;
pub const SECTOR_SIZE: usize = 1 << SECTOR_SHIFT;
/// The number of sectors in one MiB.
pub const MIB_SECTORS: u64 = 1 << (20 - SECTOR_SHIFT);
pub const DEFAULT_NAME: &str = "sbdd";
pub const DEFAULT_CAPACITY_MIB: u64 = 100;

pub use self::bio::{BioReq, BioReqBuilder, BioReqOnCompleteFn, BioResp, BioSubmission, BioType};
pub use self::block_device::BlockDevice;
pub use self::block_device_ext::BlockDeviceExt;
pub use self::config::SbddConfig;
pub use self::sbdd::{LifecycleState, Sbdd, SbddDisk};
pub use self::sector::Sector;
pub use self::segment::Segment;
pub use self::stack::{DiskHandle, DiskInfo, LocalStack, StorageStack};

// Byte offsets are computed as `usize`; sectors as `u64`.
use static_assertions::{assert_eq_size, const_assert_eq};
assert_eq_size!(usize, u64);
const_assert_eq!(SECTOR_SIZE, 512);
