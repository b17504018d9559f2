//! Read-only storage backend.
//!
//! Wraps another backend: reads pass through, writes and deletes are dropped
//! but report success. Used by `--dry-run` so a pass can be previewed without
//! touching durable state.

use async_trait::async_trait;

use crate::{BackendHandle, StorageBackend, error::Result};

/// Read-only storage backend.
///
/// Every skipped write is logged as an [`info event`](tracing::Event).
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        tracing::info!(backend = %self.inner.name(), key = %key, bytes = data.len(), "Skipping write during read-only mode");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        tracing::info!(backend = %self.inner.name(), key = %key, "Skipping delete during read-only mode");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reads_pass_through_and_writes_are_dropped() {
        let inner = Arc::new(MemoryBackend::with_values([("blacklists", "[]")]));
        let backend = ReadOnlyBackend::new(inner.clone());

        assert_eq!(backend.read("blacklists").await.unwrap(), b"[]");
        backend.write("blacklists", b"[1]").await.unwrap();
        backend.write("post-cache", b"{}").await.unwrap();
        backend.delete("blacklists").await.unwrap();

        assert_eq!(inner.read("blacklists").await.unwrap(), b"[]");
        assert!(!inner.exists("post-cache").await.unwrap());
        assert_eq!(backend.name(), "memory");
    }
}
