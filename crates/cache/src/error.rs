//! Cache Error Types

use derive_more::{Display, Error};
use gelo_post::PostId;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The admission queue gave up on the post.
    #[display("failed to fetch post {_0}")]
    Fetch(#[error(not(source))] PostId),
    /// The response body did not describe a usable post.
    #[display("failed to parse post {_0}")]
    Parse(#[error(not(source))] PostId),
    /// Durable snapshot could not be read or written.
    #[display("post cache storage error")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The queue already retried everything worth retrying.
        matches!(self, Self::Storage)
    }
}
