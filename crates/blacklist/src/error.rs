//! Blacklist Error Types

use derive_more::{Display, Error};

/// A blacklist error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for blacklist operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("rule set not found: {_0}")]
    RuleSetNotFound(#[error(not(source))] String),
    #[display("rule set is read-only: {_0}")]
    ReadOnly(#[error(not(source))] String),
    #[display("rule set cannot be removed: {_0}")]
    Unremovable(#[error(not(source))] String),
    #[display("invalid rule set name: {_0:?}")]
    InvalidName(#[error(not(source))] String),
    #[display("no rule at index {_0}")]
    RuleNotFound(#[error(not(source))] usize),
    #[display("no rule set is selected")]
    NoActiveRuleSet,
    #[display("blacklist storage error")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
