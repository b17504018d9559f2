//! CLI Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("could not open storage at {_0}")]
    Storage(#[error(not(source))] String),
    #[display("could not set up the HTTP client")]
    Fetcher,
    #[display("blacklist error")]
    Blacklist,
    #[display("could not read {_0}")]
    Read(#[error(not(source))] String),
}
