pub use crate::{errno, return_errno};
pub use crate::{Errno, Errno::*, Error, ErrorLocation, Result, ResultExt, ToErrno};
