//! Relational store abstraction
//!
//! Rows travel as JSON objects. Filters are column-equality maps, matching the
//! hosted REST API's `column=eq.value` model. Every table and column name is validated
//! as an identifier before a backend uses it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use firestorex_core::validation::{validate_identifier, InvalidIdentifier};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A row: column name to JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Column-equality filters, applied conjunctively.
pub type Filters = BTreeMap<String, Value>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::InvalidRecord(err.to_string())
    }
}

/// Table-oriented store consumed by the repositories.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Insert one row and return it as stored (with store-assigned columns).
    async fn insert(&self, table: &str, record: Record) -> DbResult<Record>;

    /// Select all rows matching every filter.
    async fn select(&self, table: &str, filters: &Filters) -> DbResult<Vec<Record>>;

    /// Update the row whose `id` equals `id`; returns the updated rows.
    async fn update(&self, table: &str, id: &str, patch: Record) -> DbResult<Vec<Record>>;

    /// Delete the row whose `id` equals `id`. Deleting a missing row is not an error.
    async fn delete(&self, table: &str, id: &str) -> DbResult<()>;

    /// Insert, or update on `id` conflict. The record must carry an `id`.
    async fn upsert(&self, table: &str, record: Record) -> DbResult<Record>;
}

/// Validate a table name and every column in a record.
pub fn check_names<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a String>,
) -> DbResult<()> {
    validate_identifier(table)?;
    for column in columns {
        validate_identifier(column)?;
    }
    Ok(())
}

/// Serialize a model into a row. The model must serialize to a JSON object.
pub fn to_record<T: Serialize>(value: &T) -> DbResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DbError::InvalidRecord(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Deserialize a row into a model.
pub fn from_record<T: DeserializeOwned>(record: Record) -> DbResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_record_requires_object() {
        assert!(to_record(&json!({"a": 1})).is_ok());
        assert!(matches!(
            to_record(&json!([1, 2])),
            Err(DbError::InvalidRecord(_))
        ));
    }

    #[test]
    fn check_names_rejects_bad_columns() {
        let good = ["name".to_string(), "size".to_string()];
        assert!(check_names("files", good.iter()).is_ok());

        let bad = ["name\"; --".to_string()];
        assert!(matches!(
            check_names("files", bad.iter()),
            Err(DbError::InvalidIdentifier(_))
        ));
        assert!(check_names("bad table", std::iter::empty()).is_err());
    }
}
