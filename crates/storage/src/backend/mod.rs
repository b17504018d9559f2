//! Storage backend trait and implementations.
//!
//! Two places need persistence: durable storage (rule sets, the active rule
//! set name, the post cache) and session storage (disabled-rule snapshots).
//! Both go through [`StorageBackend`], so the binary decides what sits behind
//! each one: a directory on disk, process memory, or a read-only wrapper.

mod local;
mod memory;
mod ro;

pub use self::local::LocalBackend;
pub use self::memory::MemoryBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use async_trait::async_trait;

/// Unified interface for key/value storage backends.
///
/// Keys must pass [`validate_key`](crate::validate_key); implementations
/// enforce this themselves and normalize the key before use.
///
/// # Examples
///
/// ```
/// use gelo_storage::{backend::StorageBackend, error::Result};
///
/// async fn stored_size(backend: &dyn StorageBackend) -> Result<usize> {
///     if backend.exists("post-cache").await? {
///         Ok(backend.read("post-cache").await?.len())
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// Check whether a value is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read the value stored under `key`.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if nothing is
    /// stored there.
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Store `data` under `key`, replacing any previous value.
    async fn write(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Remove the value stored under `key`.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if nothing is
    /// stored there.
    async fn delete(&self, key: &str) -> Result<()>;
}
