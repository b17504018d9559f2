//! Local filesystem storage backend.
//!
//! Each key is one file below the configured root directory, accessed via
//! `tokio::fs`. Writes go to a sibling temporary file first and are renamed
//! into place, so a crash mid-flush never leaves a truncated value behind.

use crate::error::{ErrorKind, Result};
use crate::{StorageBackend, validate_key};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

const TEMP_SUFFIX: &str = ".tmp";

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use gelo_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("durable", "/home/me/.local/share/gelo")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend rooted at an absolute directory,
    /// creating the directory if it doesn't exist yet.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidKey(root.display().to_string()));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::Backend(format!("storage root `{}` is not a directory", root.display())));
            }
        } else {
            // Only happens once at start-up, not worth an async constructor.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root.display().to_string()))?;
        }
        Ok(Self { name: name.into(), root })
    }

    fn absolute_path(&self, key: &str) -> Result<(String, PathBuf)> {
        let key = validate_key(key)?;
        let path = self.root.join(&key);
        Ok((key, path))
    }

    fn map_io_error(e: std::io::Error, key: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(key.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(key.to_string()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let (_, path) = self.absolute_path(key)?;
        Ok(fs::try_exists(&path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let (key, path) = self.absolute_path(key)?;
        Ok(fs::read(&path).await.map_err(|e| Self::map_io_error(e, &key))?)
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let (key, path) = self.absolute_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, &key))?;
        }
        let mut temp = path.clone().into_os_string();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);
        fs::write(&temp, data).await.map_err(|e| Self::map_io_error(e, &key))?;
        if let Err(e) = fs::rename(&temp, &path).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                tracing::warn!(key = %key, error = %cleanup, "Failed to remove temporary file after failed rename");
            }
            exn::bail!(Self::map_io_error(e, &key));
        }
        tracing::trace!(backend = %self.name, key = %key, bytes = data.len(), "Wrote value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let (key, path) = self.absolute_path(key)?;
        Ok(fs::remove_file(&path).await.map_err(|e| Self::map_io_error(e, &key))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("local", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        assert!(LocalBackend::new("name", "./relative").is_err());
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("nested/data");
        LocalBackend::new("name", &root).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(LocalBackend::new("name", &file).is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (_dir, backend) = backend();
        backend.write("blacklists", b"[]").await.unwrap();
        assert_eq!(backend.read("blacklists").await.unwrap(), b"[]");
        backend.write("blacklists", b"[1]").await.unwrap();
        assert_eq!(backend.read("blacklists").await.unwrap(), b"[1]");
    }

    #[tokio::test]
    async fn test_write_creates_directories_and_leaves_no_temp_file() {
        let (dir, backend) = backend();
        backend.write("disabled/Safe mode", b"[]").await.unwrap();
        assert!(dir.path().join("disabled/Safe mode").is_file());
        assert!(!dir.path().join("disabled/Safe mode.tmp").exists());
    }

    #[tokio::test]
    async fn test_exists() {
        let (_dir, backend) = backend();
        assert!(!backend.exists("post-cache").await.unwrap());
        backend.write("post-cache", b"{}").await.unwrap();
        assert!(backend.exists("post-cache").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let (_dir, backend) = backend();
        let err = backend.read("missing").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(key) if key == "missing"));
        let err = backend.delete("missing").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, backend) = backend();
        backend.write("active-blacklist", b"\"Safe mode\"").await.unwrap();
        backend.delete("active-blacklist").await.unwrap();
        assert!(!backend.exists("active-blacklist").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let (_dir, backend) = backend();
        let err = backend.write("../escape", b"x").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
    }
}
