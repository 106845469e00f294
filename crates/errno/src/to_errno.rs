use core::fmt;

use super::{Errno, Error};

pub trait ToErrno: fmt::Display + fmt::Debug {
    fn errno(&self) -> Errno;
}

impl<T> From<T> for Error
where
    T: ToErrno + Send + Sync + 'static,
{
    fn from(t: T) -> Error {
        Error::boxed(t, None)
    }
}

impl ToErrno for Errno {
    fn errno(&self) -> Errno {
        *self
    }
}

impl ToErrno for core::num::ParseIntError {
    fn errno(&self) -> Errno {
        Errno::EINVAL
    }
}

impl ToErrno for std::collections::TryReserveError {
    fn errno(&self) -> Errno {
        Errno::ENOMEM
    }
}

impl From<std::io::ErrorKind> for Errno {
    fn from(kind: std::io::ErrorKind) -> Errno {
        use std::io::ErrorKind::*;
        use Errno::*;
        match kind {
            NotFound => ENOENT,
            PermissionDenied => EPERM,
            BrokenPipe => EPIPE,
            AlreadyExists => EEXIST,
            WouldBlock => EAGAIN,
            InvalidInput => EINVAL,
            InvalidData => EBADMSG,
            TimedOut => ETIMEDOUT,
            Interrupted => EINTR,
            WriteZero => EINVAL,
            UnexpectedEof => EIO,
            OutOfMemory => ENOMEM,
            _ => EIO,
        }
    }
}

impl ToErrno for std::io::Error {
    fn errno(&self) -> Errno {
        Errno::from(self.kind())
    }
}

#[cfg(feature = "serde_json")]
impl ToErrno for serde_json::Error {
    fn errno(&self) -> Errno {
        if self.is_io() {
            Errno::EIO
        } else {
            Errno::EINVAL
        }
    }
}
