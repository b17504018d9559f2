//! Post Decoding Error Types
//!
//! Decoding a response body either works or it never will; none of these are
//! worth retrying.

use derive_more::{Display, Error};

/// A decoding error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The body is not the JSON document the endpoint is supposed to return.
    #[display("malformed response body: {_0}")]
    MalformedBody(#[error(not(source))] String),
    /// The body decoded fine but lists no post.
    #[display("response contains no post")]
    MissingPost,
    /// A required field is absent or empty.
    #[display("missing required field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// A field was found but could not be parsed.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// Details about the parsing failure.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
