//! Shared bucket and object path validation for storage backends.

use crate::traits::{StorageError, StorageResult};

const MAX_BUCKET_LENGTH: usize = 63;

/// Buckets are flat names: ASCII letters, digits, `-`, `_`, `.`; no `..`.
pub fn validate_bucket(bucket: &str) -> StorageResult<()> {
    let valid = !bucket.is_empty()
        && bucket.len() <= MAX_BUCKET_LENGTH
        && !bucket.contains("..")
        && bucket
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if !valid {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {}",
            bucket
        )));
    }
    Ok(())
}

/// Object paths are relative `/`-separated keys with no `..` segment.
pub fn validate_object_path(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::InvalidKey("Object path is empty".to_string()));
    }
    validate_prefix(path)
}

/// Like [`validate_object_path`] but allows the empty prefix (bucket root).
pub fn validate_prefix(prefix: &str) -> StorageResult<()> {
    if prefix.starts_with('/') || prefix.contains('\\') || prefix.contains('\0') {
        return Err(StorageError::InvalidKey(
            "Object path contains invalid characters".to_string(),
        ));
    }
    if prefix.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Object path contains a parent directory segment".to_string(),
        ));
    }
    Ok(())
}

/// Normalize a folder prefix: strip a trailing `/`.
pub fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_end_matches('/')
}
