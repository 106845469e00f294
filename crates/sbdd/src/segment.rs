use std::fmt;

use crate::prelude::*;

/// A contiguous region of a caller-owned buffer.
///
/// A segment is the unit a request is made of: the device copies sectors
/// between the region and its backing store. Only whole sectors are copied;
/// trailing bytes of a region shorter than a sector multiple are left alone.
pub struct Segment {
    buf: Box<[u8]>,
    offset: usize,
    len: usize,
}

impl Segment {
    /// Create a segment covering `len` bytes of `buf` starting at `offset`.
    pub fn new(buf: Box<[u8]>, offset: usize, len: usize) -> Result<Self> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| errno!(EINVAL, "segment range overflows"))?;
        if end > buf.len() {
            return_errno!(EINVAL, "segment range exceeds the buffer");
        }
        Ok(Self { buf, offset, len })
    }

    /// Create a segment covering a whole buffer.
    pub fn from_boxed(buf: Box<[u8]>) -> Self {
        let len = buf.len();
        Self {
            buf,
            offset: 0,
            len,
        }
    }

    /// Create a zeroed segment of `nbytes` bytes.
    pub fn zeroed(nbytes: usize) -> Self {
        Self::filled(nbytes, 0)
    }

    /// Create a segment of `nbytes` bytes all set to `val`.
    pub fn filled(nbytes: usize, val: u8) -> Self {
        Self::from_boxed(vec![val; nbytes].into_boxed_slice())
    }

    /// Returns the byte offset of the region within its buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the length of the region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of whole sectors in the region.
    pub fn num_sectors(&self) -> Sector {
        crate::sector::from_bytes(self.len)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.offset..self.offset + self.len]
    }

    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.offset..self.offset + self.len]
    }

    /// Give the underlying buffer back to the caller.
    pub fn into_boxed(self) -> Box<[u8]> {
        self.buf
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("buf_len", &self.buf.len())
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}
