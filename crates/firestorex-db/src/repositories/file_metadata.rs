use std::sync::Arc;

use firestorex_core::models::{ActorId, FileMetadata, NewFileMetadata};
use serde_json::Value;

use crate::traits::{from_record, to_record, DbResult, Filters, RelationalStore};

/// Repository for uploaded file metadata rows
#[derive(Clone)]
pub struct FileMetadataRepository {
    store: Arc<dyn RelationalStore>,
    table: String,
}

impl FileMetadataRepository {
    pub fn new(store: Arc<dyn RelationalStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Insert a metadata row and return it with its assigned id and timestamp
    #[tracing::instrument(skip(self, metadata), fields(db.table = %self.table, db.operation = "insert", storage_path = %metadata.storage_path))]
    pub async fn create(&self, metadata: &NewFileMetadata) -> DbResult<FileMetadata> {
        let record = to_record(metadata)?;
        let stored = self.store.insert(&self.table, record).await?;
        from_record(stored)
    }

    /// All files owned by an actor, newest first
    #[tracing::instrument(skip(self), fields(db.table = %self.table, db.operation = "select"))]
    pub async fn list_for_owner(&self, owner: &ActorId) -> DbResult<Vec<FileMetadata>> {
        let mut filters = Filters::new();
        filters.insert("user_id".to_string(), Value::from(owner.as_str()));

        let mut files = self
            .store
            .select(&self.table, &filters)
            .await?
            .into_iter()
            .map(from_record::<FileMetadata>)
            .collect::<DbResult<Vec<_>>>()?;

        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    /// Delete every row for `storage_path` owned by `owner`. Returns how many were removed.
    #[tracing::instrument(skip(self), fields(db.table = %self.table, db.operation = "delete"))]
    pub async fn delete_for_path(&self, owner: &ActorId, storage_path: &str) -> DbResult<usize> {
        let mut filters = Filters::new();
        filters.insert("user_id".to_string(), Value::from(owner.as_str()));
        filters.insert("storage_path".to_string(), Value::from(storage_path));

        let rows = self.store.select(&self.table, &filters).await?;
        let mut deleted = 0;
        for row in rows {
            let metadata: FileMetadata = from_record(row)?;
            self.store
                .delete(&self.table, &metadata.id.to_string())
                .await?;
            deleted += 1;
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MemoryStore;

    fn metadata(owner: &str, path: &str) -> NewFileMetadata {
        NewFileMetadata {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            size: 10,
            content_type: "application/pdf".to_string(),
            storage_path: path.to_string(),
            user_id: ActorId::new(owner),
        }
    }

    #[tokio::test]
    async fn create_assigns_identity() {
        let store = Arc::new(MemoryStore::new());
        let repo = FileMetadataRepository::new(store.clone(), "files");

        let stored = repo.create(&metadata("u1", "u1/a.pdf")).await.unwrap();
        assert_eq!(stored.storage_path, "u1/a.pdf");
        assert_eq!(stored.content_type, "application/pdf");
        assert_eq!(store.rows("files").len(), 1);
        assert_eq!(store.rows("files")[0]["type"], "application/pdf");
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let store = Arc::new(MemoryStore::new());
        let repo = FileMetadataRepository::new(store, "files");

        repo.create(&metadata("u1", "u1/a.pdf")).await.unwrap();
        repo.create(&metadata("u1", "u1/b.pdf")).await.unwrap();
        repo.create(&metadata("u2", "u2/c.pdf")).await.unwrap();

        let mine = repo.list_for_owner(&ActorId::new("u1")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|f| f.user_id.as_str() == "u1"));
    }

    #[tokio::test]
    async fn delete_for_path_only_touches_owner_rows() {
        let store = Arc::new(MemoryStore::new());
        let repo = FileMetadataRepository::new(store.clone(), "files");

        repo.create(&metadata("u1", "shared/a.pdf")).await.unwrap();
        repo.create(&metadata("u2", "shared/a.pdf")).await.unwrap();

        let deleted = repo
            .delete_for_path(&ActorId::new("u1"), "shared/a.pdf")
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.rows("files").len(), 1);
        assert_eq!(store.rows("files")[0]["user_id"], "u2");
    }
}
