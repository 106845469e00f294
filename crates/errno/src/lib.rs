//! Error handling with built-in support for POSIX errno.
//!
//! Every error carries an errno, the location of the code that raised it,
//! and optionally the error that caused it. This keeps the errors of a block
//! device uniform: whatever goes wrong (an allocation, a host registration,
//! a rejected request) ends up as one `Error` with one `Errno`.
//!
//! # How to Use
//!
//! The simplest usage involves just one macro---`errno!`.
//! ```rust
//! use errno::prelude::*;
//!
//! fn return_err() -> Result<()> {
//!    Err(errno!(EINVAL, "the root error"))
//! }
//!
//! # fn main() {
//! if let Err(e) = return_err() {
//!     println!("{}", e);
//! }
//! # }
//! ```
//! which prints something like
//! ```text
//! EINVAL (#22, Invalid argument): the root error [line = 45, file = src/lib.rs]
//! ```
//!
//! Errors can be chained with `cause_err`; `Error::backtrace` prints the
//! whole chain.
//! ```rust
//! use errno::prelude::*;
//!
//! fn return_err() -> Result<()> {
//!     Err(errno!(ENOMEM, "out of memory"))
//! }
//!
//! fn cause_err() -> Result<()> {
//!     return_err().cause_err(|_e| errno!(EIO, "unable to create the disk"))
//! }
//!
//! # fn main() {
//! if let Err(e) = cause_err() {
//!     println!("{}", e.backtrace());
//! }
//! # }
//! ```
//! which prints something like
//! ```text
//! EIO (#5, I/O error): unable to create the disk [line = 71, file = src/lib.rs]
//!     Caused by ENOMEM (#12, Out of memory): out of memory [line = 68, file = src/lib.rs]
//! ```

mod backtrace;
mod errno;
mod error;
mod macros;
pub mod prelude;
mod to_errno;

pub use self::backtrace::{ErrorBacktrace, ResultExt};
pub use self::errno::Errno;
pub use self::error::{Error, ErrorLocation};
pub use self::to_errno::ToErrno;

pub type Result<T> = core::result::Result<T, Error>;
