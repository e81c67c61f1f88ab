//! Recording object store for testing
//!
//! Keeps objects in memory and counts every `put` attempt, so tests can assert
//! that rejected uploads never reach storage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use firestorex_storage::keys::normalize_prefix;
use firestorex_storage::{
    ObjectHandle, ObjectStore, StorageBackend, StorageError, StorageResult,
};

#[derive(Clone, Default)]
pub struct RecordingObjectStore {
    objects: Arc<Mutex<BTreeMap<(String, String), (Bytes, String)>>>,
    puts: Arc<AtomicUsize>,
    fail_puts: Arc<AtomicBool>,
    fail_removes: Arc<AtomicBool>,
}

impl RecordingObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects every `put` with a backend error
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_puts.store(true, Ordering::SeqCst);
        store
    }

    pub fn fail_removes(&self) {
        self.fail_removes.store(true, Ordering::SeqCst);
    }

    /// Number of `put` calls, successful or not
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// `(bucket, path)` of every stored object
    pub fn objects(&self) -> Vec<(String, String)> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), path.to_string()))
            .map(|(data, _)| data.clone())
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<ObjectHandle> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError(
                "simulated storage outage".to_string(),
            ));
        }

        let key = (bucket.to_string(), path.to_string());
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(StorageError::AlreadyExists(format!("{}/{}", bucket, path)));
        }
        let size = data.len() as u64;
        objects.insert(key, (data, content_type.to_string()));

        Ok(ObjectHandle {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size: Some(size),
            content_type: Some(content_type.to_string()),
        })
    }

    async fn list(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<ObjectHandle>> {
        let prefix = normalize_prefix(prefix);
        let folder = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", prefix)
        };

        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((b, path), _)| b == bucket && path.starts_with(&folder))
            .map(|((b, path), (data, content_type))| ObjectHandle {
                bucket: b.clone(),
                path: path.clone(),
                size: Some(data.len() as u64),
                content_type: Some(content_type.clone()),
            })
            .collect())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed(
                "simulated delete failure".to_string(),
            ));
        }
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
