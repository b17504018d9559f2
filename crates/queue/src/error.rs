//! Queue Error Types
//!
//! Transport failures and unexpected statuses are raised by a [`Fetcher`]
//! and retried by the queue. Once the retry budget is spent, the last failure
//! is wrapped in [`ErrorKind::Exhausted`] and handed to the caller.
//!
//! [`Fetcher`]: crate::Fetcher

use derive_more::{Display, Error};

/// A queue error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for queue operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, TLS, connection reset...).
    #[display("transport error: {_0}")]
    Transport(#[error(not(source))] String),
    /// The server answered with a status that is neither success nor 429.
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// Every retry failed; the child frame holds the last failure.
    #[display("giving up on {url} after {attempts} attempts")]
    Exhausted {
        #[error(not(source))]
        url: String,
        #[error(not(source))]
        attempts: u32,
    },
    /// The queue task went away before resolving the request.
    #[display("admission queue closed before the request completed")]
    Closed,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status(_))
    }
}
