use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::keys::{normalize_prefix, validate_bucket, validate_object_path, validate_prefix};
use crate::traits::{ObjectHandle, ObjectStore, StorageError, StorageResult};
use crate::StorageBackend;

/// Local filesystem object store. Each bucket is a directory under `base_path`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for buckets (e.g., "/var/lib/firestorex/storage")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert bucket and path to a filesystem path with security validation
    ///
    /// Rejects keys that could escape the bucket directory.
    fn object_path(&self, bucket: &str, path: &str) -> StorageResult<PathBuf> {
        validate_bucket(bucket)?;
        validate_prefix(path)?;

        let bucket_dir = self.base_path.join(bucket);
        let full = bucket_dir.join(path);

        if let (Ok(base), Ok(canonical)) = (self.base_path.canonicalize(), full.canonicalize()) {
            if canonical.strip_prefix(&base).is_err() {
                return Err(StorageError::InvalidKey(
                    "Object path resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(full)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Write and flush a freshly created object file. On failure the partial file is
/// removed so the same key can be written again.
async fn write_or_discard(file_path: &Path, mut file: fs::File, data: &[u8]) -> StorageResult<()> {
    let result = match file.write_all(data).await {
        Ok(()) => match file.flush().await {
            Ok(()) => file.sync_all().await.map_err(|e| ("sync", e)),
            Err(e) => Err(("write", e)),
        },
        Err(e) => Err(("write", e)),
    };

    let Err((step, e)) = result else {
        return Ok(());
    };
    drop(file);

    if let Err(remove_err) = fs::remove_file(file_path).await {
        tracing::warn!(
            error = %remove_err,
            path = %file_path.display(),
            "Failed to remove partial file"
        );
    }

    Err(StorageError::UploadFailed(format!(
        "Failed to {} file {}: {}",
        step,
        file_path.display(),
        e
    )))
}

#[async_trait]
impl ObjectStore for LocalStorage {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<ObjectHandle> {
        validate_object_path(path)?;
        let file_path = self.object_path(bucket, path)?;
        let size = data.len() as u64;

        self.ensure_parent_dir(&file_path).await?;

        let start = std::time::Instant::now();

        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(format!("{}/{}", bucket, path)));
            }
            Err(e) => {
                return Err(StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    file_path.display(),
                    e
                )));
            }
        };

        write_or_discard(&file_path, file, &data).await?;

        tracing::info!(
            bucket = %bucket,
            path = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(ObjectHandle {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size: Some(size),
            content_type: Some(content_type.to_string()),
        })
    }

    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<ObjectHandle>> {
        let prefix = normalize_prefix(prefix);
        let dir = self.object_path(bucket, prefix)?;

        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            StorageError::ListFailed(format!("Failed to read {}: {}", dir.display(), e))
        })?;

        let mut handles = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?
        {
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;

            let path = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };

            handles.push(ObjectHandle {
                bucket: bucket.to_string(),
                path,
                size: metadata.is_file().then(|| metadata.len()),
                content_type: None,
            });
        }

        handles.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(handles)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        for path in paths {
            validate_object_path(path)?;
            let file_path = self.object_path(bucket, path)?;

            if !fs::try_exists(&file_path).await.unwrap_or(false) {
                continue;
            }

            fs::remove_file(&file_path).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            tracing::info!(bucket = %bucket, path = %path, "Local storage delete successful");
        }

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_put_and_list() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let handle = storage
            .put("files", "u1/resume.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .unwrap();

        assert_eq!(handle.path, "u1/resume.pdf");
        assert_eq!(handle.size, Some(4));
        assert_eq!(handle.content_type.as_deref(), Some("application/pdf"));

        let on_disk = std::fs::read(dir.path().join("files/u1/resume.pdf")).unwrap();
        assert_eq!(on_disk, b"%PDF");

        let listed = storage.list("files", "u1/").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path, "u1/resume.pdf");
        assert_eq!(listed[0].size, Some(4));

        let root = storage.list("files", "").await.unwrap();
        assert_eq!(root.len(), 1);
        assert!(root[0].is_folder());
        assert_eq!(root[0].path, "u1");
    }

    #[tokio::test]
    async fn test_put_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .put("files", "a.txt", Bytes::from_static(b"one"), "text/plain")
            .await
            .unwrap();
        let second = storage
            .put("files", "a.txt", Bytes::from_static(b"two"), "text/plain")
            .await;

        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));
        let on_disk = std::fs::read(dir.path().join("files/a.txt")).unwrap();
        assert_eq!(on_disk, b"one");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let target = dir.path().join("files/a.txt");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"par").unwrap();

        // Every write to /dev/full fails with ENOSPC
        let full = fs::OpenOptions::new().write(true).open("/dev/full").await.unwrap();
        let result = write_or_discard(&target, full, b"partial payload").await;

        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        assert!(!target.exists());

        storage
            .put("files", "a.txt", Bytes::from_static(b"retry"), "text/plain")
            .await
            .unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"retry");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage
            .put("files", "../../../etc/passwd", Bytes::new(), "text/plain")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.remove("files", &["../x".to_string()]).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.list("../files", "").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_remove_ignores_missing_objects() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .put("files", "keep.txt", Bytes::from_static(b"k"), "text/plain")
            .await
            .unwrap();
        storage
            .put("files", "drop.txt", Bytes::from_static(b"d"), "text/plain")
            .await
            .unwrap();

        storage
            .remove("files", &["drop.txt".to_string(), "missing.txt".to_string()])
            .await
            .unwrap();

        let remaining = storage.list("files", "").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].path, "keep.txt");
    }

    #[tokio::test]
    async fn test_list_missing_folder_is_empty() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        assert!(storage.list("files", "nobody").await.unwrap().is_empty());
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
