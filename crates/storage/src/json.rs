//! JSON-encoded values on top of any [`StorageBackend`].
//!
//! Persisted state is always loaded into a value copy, modified, and saved
//! back explicitly. Nothing holds a live view of storage.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Load and decode the value stored under `key`, or `None` if nothing is
/// stored there.
pub async fn load<T: DeserializeOwned>(backend: &dyn StorageBackend, key: &str) -> Result<Option<T>> {
    if !backend.exists(key).await? {
        return Ok(None);
    }
    let bytes = backend.read(key).await?;
    let value = serde_json::from_slice(&bytes).map_err(|e| ErrorKind::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(value))
}

/// Encode `value` and store it under `key`.
pub async fn save<T: Serialize + ?Sized>(backend: &dyn StorageBackend, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value).map_err(|e| ErrorKind::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    backend.write(key, &bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        name: String,
        ids: Vec<u64>,
    }

    #[tokio::test]
    async fn test_missing_key_loads_none() {
        let backend = MemoryBackend::default();
        let loaded: Option<Snapshot> = load(&backend, "nothing").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let backend = MemoryBackend::default();
        let snapshot = Snapshot { name: "Safe mode".into(), ids: vec![3, 1, 2] };
        save(&backend, "snapshot", &snapshot).await.unwrap();
        let loaded: Option<Snapshot> = load(&backend, "snapshot").await.unwrap();
        assert_eq!(loaded, Some(snapshot));
    }

    #[tokio::test]
    async fn test_garbage_is_a_serialization_error() {
        let backend = MemoryBackend::with_values([("snapshot", "not json")]);
        let err = load::<Snapshot>(&backend, "snapshot").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Serialization { key, .. } if key == "snapshot"));
    }
}
