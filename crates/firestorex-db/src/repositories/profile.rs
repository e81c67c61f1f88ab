use std::sync::Arc;

use firestorex_core::models::ProfileUpsert;

use crate::traits::{to_record, DbResult, RelationalStore};

#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn RelationalStore>,
    table: String,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn RelationalStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Create the profile row, or refresh it if it already exists
    #[tracing::instrument(skip(self, profile), fields(db.table = %self.table, db.operation = "upsert", db.record_id = %profile.id))]
    pub async fn upsert(&self, profile: &ProfileUpsert) -> DbResult<()> {
        let record = to_record(profile)?;
        self.store.upsert(&self.table, record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MemoryStore;
    use chrono::Utc;
    use firestorex_core::models::ActorId;

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let store = Arc::new(MemoryStore::new());
        let repo = ProfileRepository::new(store.clone(), "profiles");

        let mut profile = ProfileUpsert {
            id: ActorId::new("u1"),
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            updated_at: Utc::now(),
        };
        repo.upsert(&profile).await.unwrap();

        profile.username = "alice2".to_string();
        repo.upsert(&profile).await.unwrap();

        let rows = store.rows("profiles");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "u1");
        assert_eq!(rows[0]["username"], "alice2");
    }
}
