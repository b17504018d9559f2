//! Config Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file extension doesn't name a supported format
    #[display("unsupported config format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// An explicitly requested config file doesn't exist
    #[display("config file not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A provider failed, or the merged values don't fit the schema
    #[display("could not load configuration: {_0}")]
    Extract(#[error(not(source))] String),
    /// Values were read fine but make no sense together
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// No home directory to derive default paths from
    #[display("could not determine the user's config and data directories")]
    NoProjectDirs,
}

impl ErrorKind {
    /// Configuration errors never go away on their own.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
