//! In-memory relational store for tests
//!
//! Behaves like the hosted REST backend: inserts get an `id` and `created_at`
//! when missing, selects are column-equality filters, upserts replace on `id`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::traits::{check_names, DbError, DbResult, Filters, Record, RelationalStore};

/// Mock relational store backed by a map of table name to rows
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Vec<Record>>>>,
    failing_tables: Arc<Mutex<HashSet<String>>>,
    inserts: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert or upsert into `table` fail
    pub fn fail_inserts(&self, table: &str) {
        self.failing_tables
            .lock()
            .unwrap()
            .insert(table.to_string());
    }

    /// Snapshot of the rows currently in `table`
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of successful inserts and upserts across all tables
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn check_writable(&self, table: &str) -> DbResult<()> {
        if self.failing_tables.lock().unwrap().contains(table) {
            return Err(DbError::Backend(format!(
                "simulated write failure on {}",
                table
            )));
        }
        Ok(())
    }
}

fn matches(row: &Record, filters: &Filters) -> bool {
    filters
        .iter()
        .all(|(column, expected)| row.get(column) == Some(expected))
}

fn id_of(row: &Record) -> Option<String> {
    match row.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) if !other.is_null() => Some(other.to_string()),
        _ => None,
    }
}

#[async_trait]
impl RelationalStore for MemoryStore {
    async fn insert(&self, table: &str, mut record: Record) -> DbResult<Record> {
        check_names(table, record.keys())?;
        self.check_writable(table)?;

        record
            .entry("id")
            .or_insert_with(|| Value::from(Uuid::new_v4().to_string()));
        record
            .entry("created_at")
            .or_insert_with(|| Value::from(Utc::now().to_rfc3339()));

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        if let Some(id) = id_of(&record) {
            if rows.iter().any(|r| id_of(r).as_deref() == Some(id.as_str())) {
                return Err(DbError::Conflict(format!("duplicate id {}", id)));
            }
        }
        rows.push(record.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn select(&self, table: &str, filters: &Filters) -> DbResult<Vec<Record>> {
        check_names(table, filters.keys())?;
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| matches(row, filters))
            .collect())
    }

    async fn update(&self, table: &str, id: &str, patch: Record) -> DbResult<Vec<Record>> {
        check_names(table, patch.keys())?;
        let mut tables = self.tables.lock().unwrap();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if id_of(row).as_deref() == Some(id) {
                    for (column, value) in &patch {
                        row.insert(column.clone(), value.clone());
                    }
                    updated.push(row.clone());
                }
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: &str) -> DbResult<()> {
        check_names(table, std::iter::empty())?;
        if let Some(rows) = self.tables.lock().unwrap().get_mut(table) {
            rows.retain(|row| id_of(row).as_deref() != Some(id));
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, record: Record) -> DbResult<Record> {
        check_names(table, record.keys())?;
        self.check_writable(table)?;
        let id = id_of(&record)
            .ok_or_else(|| DbError::InvalidRecord("upsert requires an id".to_string()))?;

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        match rows
            .iter_mut()
            .find(|row| id_of(row).as_deref() == Some(id.as_str()))
        {
            Some(existing) => {
                for (column, value) in &record {
                    existing.insert(column.clone(), value.clone());
                }
            }
            None => rows.push(record.clone()),
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let row = store
            .insert("files", record(json!({"name": "a"})))
            .await
            .unwrap();
        assert!(row.contains_key("id"));
        assert!(row.contains_key("created_at"));
        assert_eq!(store.insert_count(), 1);
    }

    #[tokio::test]
    async fn select_update_delete_by_id() {
        let store = MemoryStore::new();
        let row = store
            .insert("files", record(json!({"name": "a", "user_id": "u1"})))
            .await
            .unwrap();
        store
            .insert("files", record(json!({"name": "b", "user_id": "u2"})))
            .await
            .unwrap();
        let id = id_of(&row).unwrap();

        let mut filters = Filters::new();
        filters.insert("user_id".to_string(), json!("u1"));
        assert_eq!(store.select("files", &filters).await.unwrap().len(), 1);

        let updated = store
            .update("files", &id, record(json!({"name": "renamed"})))
            .await
            .unwrap();
        assert_eq!(updated[0]["name"], "renamed");

        store.delete("files", &id).await.unwrap();
        assert_eq!(store.rows("files").len(), 1);
    }

    #[tokio::test]
    async fn failing_table_rejects_writes() {
        let store = MemoryStore::new();
        store.fail_inserts("files");
        assert!(store.insert("files", Record::new()).await.is_err());
        assert!(store.insert("other", Record::new()).await.is_ok());
        assert_eq!(store.insert_count(), 1);
    }
}
