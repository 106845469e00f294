pub(crate) use errno::prelude::{Errno::*, Result, *};
pub(crate) use spin::mutex::{Mutex, MutexGuard};
pub(crate) use std::sync::Arc;

pub(crate) use crate::{
    BioReq, BioSubmission, BioType, BlockDevice, Sector, Segment, MIB_SECTORS, SECTOR_SHIFT,
    SECTOR_SIZE,
};
