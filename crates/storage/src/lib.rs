pub mod backend;
pub mod error;
pub mod json;
mod key;

pub use crate::backend::StorageBackend;
pub use crate::key::validate as validate_key;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
