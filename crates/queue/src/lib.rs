pub mod error;
mod fetcher;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod queue;
mod settings;

pub use crate::fetcher::{Fetcher, FetcherHandle, HttpFetcher, Response};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::{MockFetcher, Reply};
pub use crate::queue::{AdmissionQueue, QueueEvent, QueueStats};
pub use crate::settings::Settings;
