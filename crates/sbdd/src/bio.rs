//! Block I/O (BIO).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::prelude::*;

/// The type of a block request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BioType {
    /// A read request.
    Read,
    /// A write request.
    Write,
}

/// A builder for `BioReq`.
pub struct BioReqBuilder {
    type_: BioType,
    addr: Option<Sector>,
    segments: Option<Vec<Segment>>,
    on_complete: Option<BioReqOnCompleteFn>,
}

impl BioReqBuilder {
    /// Create a builder of a block request of the given type.
    pub fn new(type_: BioType) -> Self {
        Self {
            type_,
            addr: None,
            segments: None,
            on_complete: None,
        }
    }

    /// Specify the starting sector of the request.
    pub fn addr(mut self, addr: Sector) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Give the segments of the request, in the order they are to be applied.
    pub fn segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = Some(segments);
        self
    }

    /// Add one segment after those given so far.
    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.get_or_insert_with(Vec::new).push(segment);
        self
    }

    /// Specify a callback invoked when the request is complete.
    pub fn on_complete(mut self, on_complete: BioReqOnCompleteFn) -> Self {
        self.on_complete = Some(on_complete);
        self
    }

    /// Build the request.
    pub fn build(mut self) -> BioReq {
        let addr = self.addr.unwrap_or(0);
        let segments = self.segments.take().unwrap_or_default();
        let num_sectors = segments
            .iter()
            .map(|seg| seg.num_sectors())
            .fold(0, |sum: Sector, n| sum.saturating_add(n));

        BioReq {
            id: next_req_id(),
            type_: self.type_,
            addr,
            num_sectors,
            segments: Mutex::new(segments),
            status: Mutex::new(Status::Init),
            on_complete: Mutex::new(self.on_complete.take()),
        }
    }
}

/// A block I/O request.
pub struct BioReq {
    id: u64,
    type_: BioType,
    addr: Sector,
    num_sectors: Sector,
    segments: Mutex<Vec<Segment>>,
    status: Mutex<Status>,
    on_complete: Mutex<Option<BioReqOnCompleteFn>>,
}

/// A response from a block device.
pub type BioResp = core::result::Result<(), Errno>;

/// The type of the callback function invoked upon the completion of
/// a block I/O request.
pub type BioReqOnCompleteFn = Box<dyn FnOnce(&BioReq, &BioResp) + Send + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Init,
    Submitted,
    Completed(BioResp),
}

fn next_req_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

impl BioReq {
    /// Create a read request.
    pub fn new_read(
        addr: Sector,
        segments: Vec<Segment>,
        on_complete: Option<BioReqOnCompleteFn>,
    ) -> Self {
        Self::new(BioType::Read, addr, segments, on_complete)
    }

    /// Create a write request.
    pub fn new_write(
        addr: Sector,
        segments: Vec<Segment>,
        on_complete: Option<BioReqOnCompleteFn>,
    ) -> Self {
        Self::new(BioType::Write, addr, segments, on_complete)
    }

    fn new(
        type_: BioType,
        addr: Sector,
        segments: Vec<Segment>,
        on_complete: Option<BioReqOnCompleteFn>,
    ) -> Self {
        let builder = BioReqBuilder::new(type_).addr(addr).segments(segments);
        match on_complete {
            Some(on_complete) => builder.on_complete(on_complete).build(),
            None => builder.build(),
        }
    }

    /// Returns a unique ID of the request.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the type of the request.
    pub fn type_(&self) -> BioType {
        self.type_
    }

    /// Returns the starting sector of the request.
    pub fn addr(&self) -> Sector {
        self.addr
    }

    /// Returns the number of sectors the segments of the request cover.
    ///
    /// The device may transfer fewer if the range runs past its end.
    pub fn num_sectors(&self) -> Sector {
        self.num_sectors
    }

    /// Returns the number of segments of the request.
    pub fn num_segments(&self) -> usize {
        self.segments.lock().len()
    }

    /// Access the immutable segments with a closure.
    pub fn access_segments_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[Segment]) -> R,
    {
        let segments = self.segments.lock();
        f(&segments)
    }

    /// Access the mutable segments with a closure.
    pub fn access_mut_segments_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut [Segment]) -> R,
    {
        let mut segments = self.segments.lock();
        f(&mut segments)
    }

    /// Take the segments out of the request.
    pub fn take_segments(&self) -> Vec<Segment> {
        core::mem::take(&mut *self.segments.lock())
    }

    /// Returns the response to the request.
    ///
    /// If the request is completed, the method returns `Some(resp)`, where `resp`
    /// is the response to the request. Otherwise, the method returns `None`.
    pub fn response(&self) -> Option<BioResp> {
        match *self.status.lock() {
            Status::Completed(resp) => Some(resp),
            _ => None,
        }
    }

    /// Update the status of the request to "completed" by giving the response
    /// to the request.
    ///
    /// After this call the request must have taken effect: a completed read
    /// has all its segments filled. Only a block device calls this.
    pub(crate) fn complete(&self, resp: BioResp) {
        let mut status = self.status.lock();
        match *status {
            Status::Submitted => {
                *status = Status::Completed(resp);
                drop(status);

                let on_complete = self.on_complete.lock().take();
                if let Some(on_complete) = on_complete {
                    (on_complete)(self, &resp);
                }
            }
            _ => panic!("cannot complete before submitting or complete twice"),
        }
    }

    /// Update the status of the request to "submitted".
    fn submit(&self) {
        let mut status = self.status.lock();
        match *status {
            Status::Init => {
                *status = Status::Submitted;
            }
            _ => panic!("cannot submit a request twice"),
        }
    }
}

impl fmt::Debug for BioReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BioReq")
            .field("id", &self.id())
            .field("type", &self.type_())
            .field("addr", &self.addr())
            .field("num_segments", &self.num_segments())
            .field("num_sectors", &self.num_sectors())
            .field("resp", &self.response())
            .finish()
    }
}

impl PartialEq for BioReq {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for BioReq {}

impl Hash for BioReq {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

/// A submitted block request.
#[derive(Debug)]
pub struct BioSubmission {
    req: Arc<BioReq>,
}

impl BioSubmission {
    pub fn new(req: Arc<BioReq>) -> Self {
        req.submit();
        Self { req }
    }

    /// Returns the submitted request.
    pub fn req(&self) -> &Arc<BioReq> {
        &self.req
    }

    /// Returns the response, or `None` if the request is still in flight.
    pub fn response(&self) -> Option<BioResp> {
        self.req.response()
    }

    pub fn into_req(self) -> Arc<BioReq> {
        self.req
    }
}
