//! Object storage abstraction trait
//!
//! This module defines the ObjectStore trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StorageBackend;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object path: {0}")]
    InvalidKey(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Reference to a stored object (or, from `list`, a folder entry with no size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHandle {
    pub bucket: String,
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl ObjectHandle {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
            size: None,
            content_type: None,
        }
    }

    /// Folder entries returned by `list` carry no size.
    pub fn is_folder(&self) -> bool {
        self.size.is_none()
    }
}

/// Object storage abstraction trait
///
/// All storage backends (hosted storage API, local filesystem) implement this trait,
/// so the upload pipeline works against any of them.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` to `bucket`/`path`. Fails with `AlreadyExists` if the object is present.
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<ObjectHandle>;

    /// List the immediate entries under `prefix` (a folder path, `""` for the bucket root).
    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<ObjectHandle>>;

    /// Remove objects. Paths that do not exist are ignored.
    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
