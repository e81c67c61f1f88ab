//! Object storage over the hosted storage API (`/storage/v1/object/...`).

use async_trait::async_trait;
use bytes::Bytes;
use firestorex_storage::keys::{normalize_prefix, validate_bucket, validate_object_path, validate_prefix};
use firestorex_storage::{ObjectHandle, ObjectStore, StorageBackend, StorageError, StorageResult};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::{encode_path, BackendClient};

const LIST_PAGE_SIZE: usize = 100;

/// [`ObjectStore`] backed by the hosted storage API.
#[derive(Clone)]
pub struct RemoteStorage {
    client: BackendClient,
}

impl RemoteStorage {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    /// Null for folder placeholders
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: Option<EntryMetadata>,
}

#[derive(Debug, Deserialize)]
struct EntryMetadata {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    mimetype: Option<String>,
}

#[async_trait]
impl ObjectStore for RemoteStorage {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<ObjectHandle> {
        validate_bucket(bucket)?;
        validate_object_path(path)?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let request = self
            .client
            .request(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", bucket, encode_path(path)),
            )
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data);

        self.client.send(request).await.map_err(StorageError::from)?;

        tracing::info!(
            bucket = %bucket,
            path = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote storage upload successful"
        );

        Ok(ObjectHandle {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size: Some(size),
            content_type: Some(content_type.to_string()),
        })
    }

    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<ObjectHandle>> {
        validate_bucket(bucket)?;
        validate_prefix(prefix)?;
        let prefix = normalize_prefix(prefix);

        let mut handles = Vec::new();
        let mut offset = 0;
        loop {
            let request = self
                .client
                .request(Method::POST, &format!("/storage/v1/object/list/{}", bucket))
                .json(&json!({
                    "prefix": prefix,
                    "limit": LIST_PAGE_SIZE,
                    "offset": offset,
                    "sortBy": { "column": "name", "order": "asc" },
                }));

            let page: Vec<ListEntry> = self
                .client
                .send_json(request)
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;
            let page_len = page.len();

            handles.extend(page.into_iter().map(|entry| {
                let path = if prefix.is_empty() {
                    entry.name
                } else {
                    format!("{}/{}", prefix, entry.name)
                };
                let metadata = entry.metadata.filter(|_| entry.id.is_some());
                ObjectHandle {
                    bucket: bucket.to_string(),
                    path,
                    size: metadata.as_ref().and_then(|m| m.size),
                    content_type: metadata.and_then(|m| m.mimetype),
                }
            }));

            if page_len < LIST_PAGE_SIZE {
                break;
            }
            offset += page_len;
        }

        Ok(handles)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        validate_bucket(bucket)?;
        for path in paths {
            validate_object_path(path)?;
        }
        if paths.is_empty() {
            return Ok(());
        }

        let request = self
            .client
            .request(Method::DELETE, &format!("/storage/v1/object/{}", bucket))
            .json(&json!({ "prefixes": paths }));

        self.client
            .send(request)
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        tracing::info!(bucket = %bucket, count = paths.len(), "Remote storage delete successful");
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Remote
    }
}
