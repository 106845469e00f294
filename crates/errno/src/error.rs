use core::fmt;

use super::{Errno, ToErrno};

#[derive(Debug)]
pub struct Error {
    inner: Inner,
    location: Option<ErrorLocation>,
    cause: Option<Box<Error>>,
}

#[derive(Debug)]
enum Inner {
    Embedded((Errno, &'static str)),
    Boxed(Box<dyn ToErrno + Send + Sync + 'static>),
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorLocation {
    line: u32,
    file: &'static str,
}

impl Error {
    pub fn embedded(inner: (Errno, &'static str), location: Option<ErrorLocation>) -> Error {
        Error {
            inner: Inner::Embedded(inner),
            location,
            cause: None,
        }
    }

    pub fn boxed<T>(inner: T, location: Option<ErrorLocation>) -> Error
    where
        T: ToErrno + Send + Sync + 'static,
    {
        Error {
            inner: Inner::Boxed(Box::new(inner)),
            location,
            cause: None,
        }
    }

    pub fn errno(&self) -> Errno {
        match &self.inner {
            Inner::Embedded((errno, _)) => *errno,
            Inner::Boxed(inner_error) => inner_error.errno(),
        }
    }

    pub fn get_cause_mut(&mut self) -> &mut Option<Box<Error>> {
        &mut self.cause
    }

    pub fn get_cause(&self) -> &Option<Box<Error>> {
        &self.cause
    }
}

impl ErrorLocation {
    pub fn new(file: &'static str, line: u32) -> ErrorLocation {
        ErrorLocation { file, line }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner)?;
        if let Some(location) = self.location {
            write!(f, " {}", location)?;
        }
        Ok(())
    }
}

impl fmt::Display for Inner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Inner::Embedded((errno, msg)) => write!(f, "{}: {}", errno, msg),
            Inner::Boxed(inner_error) => write!(f, "{}: {}", inner_error.errno(), inner_error),
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[line = {}, file = {}]", self.line, self.file)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
