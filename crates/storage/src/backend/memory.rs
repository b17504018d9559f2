//! In-memory storage backend.
//!
//! Backs session storage in the binary (lost when the process exits) and
//! stands in for durable storage in tests.

use crate::error::{ErrorKind, Result};
use crate::{StorageBackend, validate_key};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory storage backend.
///
/// Values live in a `HashMap` behind a [`RwLock`], so all trait methods
/// operate on `&self` without external synchronisation.
///
/// ```
/// use gelo_storage::backend::{MemoryBackend, StorageBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::with_values([("active-blacklist", "\"Safe mode\"")]);
/// assert!(backend.exists("active-blacklist").await?);
/// backend.write("post-cache", b"{}").await?;
/// assert_eq!(backend.read("post-cache").await?, b"{}");
/// # Ok(())
/// # }
/// ```
pub struct MemoryBackend {
    name: String,
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Create a backend pre-populated with values.
    ///
    /// Panics if any key fails validation; only test setup should pass
    /// literal keys here.
    pub fn with_values(values: impl IntoIterator<Item = (impl AsRef<str>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        for (key, data) in values {
            let Ok(validated) = validate_key(key.as_ref()) else {
                panic!("MemoryBackend::with_values: invalid key {}", key.as_ref());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "memory".to_string(),
            values: RwLock::new(map),
        }
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = validate_key(key)?;
        Ok(self.values.read().await.contains_key(&key))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let key = validate_key(key)?;
        match self.values.read().await.get(&key) {
            Some(data) => Ok(data.clone()),
            None => exn::bail!(ErrorKind::NotFound(key)),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let key = validate_key(key)?;
        self.values.write().await.insert(key, data.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = validate_key(key)?;
        match self.values.write().await.remove(&key) {
            Some(_) => Ok(()),
            None => exn::bail!(ErrorKind::NotFound(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_values_normalizes_keys() {
        let backend = MemoryBackend::with_values([("disabled//Safe mode", "[]")]);
        assert_eq!(backend.keys().await, vec!["disabled/Safe mode".to_string()]);
        assert_eq!(backend.read("disabled/Safe mode").await.unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_overwrite_and_delete() {
        let backend = MemoryBackend::default();
        backend.write("blacklists", b"a").await.unwrap();
        backend.write("blacklists", b"b").await.unwrap();
        assert_eq!(backend.read("blacklists").await.unwrap(), b"b");
        backend.delete("blacklists").await.unwrap();
        assert!(!backend.exists("blacklists").await.unwrap());
        let err = backend.delete("blacklists").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    #[should_panic(expected = "invalid key")]
    fn test_with_values_panics_on_invalid_key() {
        let _ = MemoryBackend::with_values([("../nope", "x")]);
    }
}
