//! Failure kinds reported by buffer and generator operations.

pub type Result<T> = std::result::Result<T, Error>;

/// Every fallible operation reports one of three kinds. Messages are meant for humans,
/// use [`Error::kind`] to branch on the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Byte index or sector parameters beyond the buffer
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Non-positive sizes, bit index wider than the accessor, inconsistent compare spans
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation invariant violated or unsupported buffer configuration
    #[error("Runtime error: {0}")]
    Runtime(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OutOfRange,
    InvalidArgument,
    Runtime,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OutOfRange(_) => ErrorKind::OutOfRange,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Runtime(_) => ErrorKind::Runtime,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::OutOfRange(m) | Error::InvalidArgument(m) | Error::Runtime(m) => m,
        }
    }

    pub(crate) fn out_of_range(msg: impl Into<String>) -> Self {
        Error::OutOfRange(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Runtime(format!("serialization failed: {}", e))
    }
}
