use crate::prelude::*;

/// A block device.
pub trait BlockDevice: Send + Sync {
    /// Return the total number of sectors in the device.
    fn total_sectors(&self) -> Sector;

    /// Submit an I/O request to the device, returning the I/O submission that
    /// corresponds to the I/O request.
    ///
    /// The status of the request can be queried via the submission object.
    /// A device that cannot serve the request completes it with an error
    /// response rather than returning one.
    fn submit(&self, req: Arc<BioReq>) -> BioSubmission;
}

impl<'a> dyn BlockDevice + 'a {
    /// Return the total number of bytes in the device.
    pub fn total_bytes(&self) -> usize {
        crate::sector::to_bytes(self.total_sectors())
    }
}
