use crate::prelude::*;
use crate::sector;

/// An extension trait for block devices to support file-like I/O operations
/// at sector-aligned byte offsets.
pub trait BlockDeviceExt {
    /// Read bytes at a byte offset on the device.
    ///
    /// Returns the number of bytes read, which is short if the range runs
    /// past the end of the device.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<usize>;

    /// Write bytes at a byte offset on the device.
    ///
    /// Returns the number of bytes written, which is short if the range runs
    /// past the end of the device.
    fn write(&self, offset: usize, buf: &[u8]) -> Result<usize>;
}

impl<'d> BlockDeviceExt for dyn BlockDevice + 'd {
    fn read(&self, offset: usize, read_buf: &mut [u8]) -> Result<usize> {
        Impl::new(self).read(offset, read_buf)
    }

    fn write(&self, offset: usize, write_buf: &[u8]) -> Result<usize> {
        Impl::new(self).write(offset, write_buf)
    }
}

impl<B: BlockDevice> BlockDeviceExt for B {
    fn read(&self, offset: usize, read_buf: &mut [u8]) -> Result<usize> {
        Impl::new(self).read(offset, read_buf)
    }

    fn write(&self, offset: usize, write_buf: &[u8]) -> Result<usize> {
        Impl::new(self).write(offset, write_buf)
    }
}

// We cannot add private methods to trait (e.g., BlockDeviceExt). So the Impl
// struct is introduced as a zero-cost means to workaround the limitation.
struct Impl<'a> {
    disk: &'a dyn BlockDevice,
}

impl<'a> Impl<'a> {
    pub fn new(disk: &'a dyn BlockDevice) -> Self {
        Self { disk }
    }

    pub fn read(&self, offset: usize, read_buf: &mut [u8]) -> Result<usize> {
        let len = self.check_and_clamp(offset, read_buf.len())?;
        if len == 0 {
            return Ok(0);
        }

        let req = BioReq::new_read(
            sector::from_bytes(offset),
            vec![Segment::zeroed(len)],
            None,
        );
        let req = self.submit_and_check(req, "read on the block device failed")?;

        req.access_segments_with(|segments| {
            read_buf[..len].copy_from_slice(segments[0].as_slice());
        });
        Ok(len)
    }

    pub fn write(&self, offset: usize, write_buf: &[u8]) -> Result<usize> {
        let len = self.check_and_clamp(offset, write_buf.len())?;
        if len == 0 {
            return Ok(0);
        }

        let segment = Segment::from_boxed(write_buf[..len].to_vec().into_boxed_slice());
        let req = BioReq::new_write(sector::from_bytes(offset), vec![segment], None);
        self.submit_and_check(req, "write on the block device failed")?;
        Ok(len)
    }

    /// Returns how many of the `len` bytes at `offset` lie on the device.
    fn check_and_clamp(&self, offset: usize, len: usize) -> Result<usize> {
        if !sector::is_aligned(offset) || !sector::is_aligned(len) {
            return_errno!(EINVAL, "offset or length not aligned with sector size");
        }

        // The device truncates silently. Compute the covered length here so
        // that callers learn about short transfers.
        let total_bytes = sector::to_bytes(self.disk.total_sectors());
        if offset >= total_bytes {
            return Ok(0);
        }
        Ok(len.min(total_bytes - offset))
    }

    fn submit_and_check(&self, req: BioReq, msg: &'static str) -> Result<Arc<BioReq>> {
        let submission = self.disk.submit(Arc::new(req));
        match submission.response() {
            Some(Ok(())) => Ok(submission.into_req()),
            Some(Err(errno)) => Err(errno!(errno, msg)),
            None => Err(errno!(EIO, "request not completed by the block device")),
        }
    }
}
