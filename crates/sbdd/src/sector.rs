//! Sector arithmetic.
use crate::prelude::*;

/// A sector address or a number of sectors.
pub type Sector = u64;

/// Returns the number of bytes in `sectors` sectors.
pub const fn to_bytes(sectors: Sector) -> usize {
    (sectors as usize) << SECTOR_SHIFT
}

/// Returns the number of whole sectors in `nbytes` bytes.
pub const fn from_bytes(nbytes: usize) -> Sector {
    (nbytes >> SECTOR_SHIFT) as Sector
}

/// Returns the sector that a sector-aligned byte offset points to.
pub fn from_offset_aligned(offset: usize) -> Result<Sector> {
    if !is_aligned(offset) {
        return_errno!(EINVAL, "offset not aligned with sector size");
    }
    Ok(from_bytes(offset))
}

pub const fn is_aligned(nbytes: usize) -> bool {
    nbytes % SECTOR_SIZE == 0
}

/// Returns the number of sectors in a disk of `capacity_mib` MiB, or `None`
/// if its byte size does not fit in memory addresses.
pub fn capacity_from_mib(capacity_mib: u64) -> Option<Sector> {
    let sectors = capacity_mib.checked_mul(MIB_SECTORS)?;
    let nbytes = sectors.checked_mul(SECTOR_SIZE as u64)?;
    if nbytes > isize::MAX as u64 {
        return None;
    }
    Some(sectors)
}
