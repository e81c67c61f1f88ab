use std::sync::Arc;

use firestorex_core::models::{ActorId, AuditEvent, NewAuditEvent};
use serde_json::Value;

use crate::traits::{from_record, to_record, DbResult, Filters, RelationalStore};

/// Append-only access to the activity log table
#[derive(Clone)]
pub struct ActivityLogRepository {
    store: Arc<dyn RelationalStore>,
    table: String,
}

impl ActivityLogRepository {
    pub fn new(store: Arc<dyn RelationalStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    #[tracing::instrument(skip(self, event), fields(db.table = %self.table, db.operation = "insert", action = event.action.as_str()))]
    pub async fn append(&self, event: &NewAuditEvent) -> DbResult<()> {
        let record = to_record(event)?;
        self.store.insert(&self.table, record).await?;
        Ok(())
    }

    /// Events recorded for an actor, newest first
    #[tracing::instrument(skip(self), fields(db.table = %self.table, db.operation = "select"))]
    pub async fn list_for_actor(&self, actor: &ActorId) -> DbResult<Vec<AuditEvent>> {
        let mut filters = Filters::new();
        filters.insert("user_id".to_string(), Value::from(actor.as_str()));

        let mut events = self
            .store
            .select(&self.table, &filters)
            .await?
            .into_iter()
            .map(from_record::<AuditEvent>)
            .collect::<DbResult<Vec<_>>>()?;

        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }
}
