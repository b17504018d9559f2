//! Storage key validation.
//!
//! Keys are `/`-separated segments (`post-cache`, `disabled/Safe mode`). The
//! local backend maps them straight onto the filesystem, so anything that
//! could escape the storage root is rejected up front.

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a storage key.
///
/// Empty segments and `.` are dropped, `..` and null bytes are rejected, as is
/// a key with no segments left.
///
/// ```
/// use gelo_storage::validate_key;
/// assert_eq!(validate_key("disabled//Safe mode").unwrap(), "disabled/Safe mode");
/// assert!(validate_key("../etc/passwd").is_err());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate(key: impl AsRef<str>) -> Result<String> {
    let key = key.as_ref();
    let mut segments = Vec::new();
    for segment in key.split('/') {
        match segment {
            "" | "." => {},
            ".." => exn::bail!(ErrorKind::InvalidKey(key.to_string())),
            s if s.contains('\0') || s.contains('\\') => exn::bail!(ErrorKind::InvalidKey(key.to_string())),
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(segments.join("/"))
}
