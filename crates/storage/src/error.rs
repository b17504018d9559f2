//! Storage Error Types
//!
//! Every fallible storage operation returns an [`Exn`](exn::Exn) over
//! [`ErrorKind`], so callers in other crates can `or_raise()` their own kind
//! on top and keep the storage frame as a child.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Nothing is stored under the key
    #[display("key not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied by the operating system
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Key is empty, contains a null byte, or tries to leave the storage root
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// Stored value could not be encoded or decoded
    #[display("serialization error for key {key}: {reason}")]
    Serialization {
        #[error(not(source))]
        key: String,
        #[error(not(source))]
        reason: String,
    },
    /// Backend-specific error
    #[display("backend error: {_0}")]
    Backend(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Backend(_))
    }
}
