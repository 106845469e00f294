use crate::device::DeviceState;
use crate::prelude::*;

/// Copy one segment between the caller and the backing store, starting at
/// sector `pos` of the disk.
///
/// The length is clamped to the end of the disk, and to zero if `pos` is
/// at or past the end. Returns the number of sectors actually copied; a
/// truncated copy is not an error.
pub(crate) fn transfer(
    state: &DeviceState,
    seg: &mut Segment,
    pos: Sector,
    dir: BioType,
) -> Sector {
    let capacity = state.capacity();
    let len = if pos >= capacity {
        0
    } else {
        seg.num_sectors().min(capacity - pos)
    };
    if len == 0 {
        trace!("pos={:6} len={:4} skipped", pos, len);
        return 0;
    }

    let offset = crate::sector::to_bytes(pos);
    let nbytes = crate::sector::to_bytes(len);

    let mut store = state.lock_store();
    let Some(data) = store.as_mut() else {
        error!("transfer on a disk without backing store");
        return 0;
    };
    match dir {
        BioType::Write => {
            data[offset..offset + nbytes].copy_from_slice(&seg.as_slice()[..nbytes]);
        }
        BioType::Read => {
            seg.as_slice_mut()[..nbytes].copy_from_slice(&data[offset..offset + nbytes]);
        }
    }
    drop(store);

    debug!(
        "pos={:6} len={:4} {}",
        pos,
        len,
        match dir {
            BioType::Write => "written",
            BioType::Read => "read",
        }
    );
    len
}
