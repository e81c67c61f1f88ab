//! Direct Postgres backend for [`RelationalStore`].
//!
//! Rows are mapped through JSONB: inserts and updates go through
//! `jsonb_populate_record(NULL::table, $1)` so column types come from the table
//! definition, and rows come back as `to_jsonb(t.*)`. Identifiers are validated
//! and double-quoted before interpolation; values are always bound.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};

use crate::traits::{check_names, DbError, DbResult, Filters, Record, RelationalStore};

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Postgres-backed relational store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "Connected to Postgres");
        Ok(Self::new(pool))
    }

    /// Create the `files`, `activity_logs`, and `profiles` tables if missing.
    pub async fn migrate(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DbError::Backend(format!("Migration failed: {}", e)))?;
        Ok(())
    }

}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

fn column_list(record: &Record) -> String {
    record
        .keys()
        .map(|c| quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT` for `record`. An empty record inserts a row of column defaults and
/// takes no parameters.
fn insert_sql(table: &str, record: &Record) -> String {
    let table_q = quote(table);

    if record.is_empty() {
        return format!("INSERT INTO {table_q} DEFAULT VALUES RETURNING to_jsonb({table_q}.*)");
    }

    let cols = column_list(record);
    format!(
        "INSERT INTO {table_q} ({cols}) \
         SELECT {cols} FROM jsonb_populate_record(NULL::{table_q}, $1) \
         RETURNING to_jsonb({table_q}.*)"
    )
}

#[async_trait]
impl RelationalStore for PgStore {
    #[tracing::instrument(skip(self, record), fields(db.table = %table))]
    async fn insert(&self, table: &str, record: Record) -> DbResult<Record> {
        check_names(table, record.keys())?;
        let sql = insert_sql(table, &record);

        let mut query = sqlx::query_scalar::<Postgres, Value>(&sql);
        if !record.is_empty() {
            query = query.bind(Json(Value::Object(record)));
        }
        let row: Value = query.fetch_one(&self.pool).await?;

        into_record(row)
    }

    #[tracing::instrument(skip(self, filters), fields(db.table = %table, filter_count = filters.len()))]
    async fn select(&self, table: &str, filters: &Filters) -> DbResult<Vec<Record>> {
        check_names(table, filters.keys())?;
        let sql = format!(
            "SELECT to_jsonb(t.*) FROM {} AS t WHERE to_jsonb(t.*) @> $1",
            quote(table)
        );

        let containment: Record = filters.clone().into_iter().collect();
        let rows: Vec<Value> = sqlx::query_scalar::<Postgres, Value>(&sql)
            .bind(Json(Value::Object(containment)))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_record).collect()
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = %table, db.record_id = %id))]
    async fn update(&self, table: &str, id: &str, patch: Record) -> DbResult<Vec<Record>> {
        check_names(table, patch.keys())?;
        if patch.is_empty() {
            return Err(DbError::InvalidRecord("update patch is empty".to_string()));
        }
        let table_q = quote(table);
        let assignments = patch
            .keys()
            .map(|c| format!("{col} = p.{col}", col = quote(c)))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "UPDATE {table_q} AS t SET {assignments} \
             FROM jsonb_populate_record(NULL::{table_q}, $1) AS p \
             WHERE t.id::text = $2 \
             RETURNING to_jsonb(t.*)"
        );

        let rows: Vec<Value> = sqlx::query_scalar::<Postgres, Value>(&sql)
            .bind(Json(Value::Object(patch)))
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_record).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = %table, db.record_id = %id))]
    async fn delete(&self, table: &str, id: &str) -> DbResult<()> {
        check_names(table, std::iter::empty())?;
        let sql = format!("DELETE FROM {} AS t WHERE t.id::text = $1", quote(table));

        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, record), fields(db.table = %table))]
    async fn upsert(&self, table: &str, record: Record) -> DbResult<Record> {
        check_names(table, record.keys())?;
        if !record.contains_key("id") {
            return Err(DbError::InvalidRecord("upsert requires an id".to_string()));
        }
        let table_q = quote(table);
        let cols = column_list(&record);
        let updates = record
            .keys()
            .filter(|c| c.as_str() != "id")
            .map(|c| format!("{col} = EXCLUDED.{col}", col = quote(c)))
            .collect::<Vec<_>>();

        let on_conflict = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        let sql = format!(
            "INSERT INTO {table_q} ({cols}) \
             SELECT {cols} FROM jsonb_populate_record(NULL::{table_q}, $1) \
             ON CONFLICT (id) {on_conflict} \
             RETURNING to_jsonb({table_q}.*)"
        );

        let row: Option<Value> = sqlx::query_scalar::<Postgres, Value>(&sql)
            .bind(Json(Value::Object(record.clone())))
            .fetch_optional(&self.pool)
            .await?;

        // DO NOTHING returns no row when the id already existed.
        match row {
            Some(row) => into_record(row),
            None => Ok(record),
        }
    }
}

fn into_record(row: Value) -> DbResult<Record> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(DbError::InvalidRecord(format!(
            "expected a row object, got {}",
            other
        ))),
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound("no rows returned".to_string()),
            sqlx::Error::Database(ref db_err) => match db_err.code().as_deref() {
                Some("23505") => DbError::Conflict(db_err.message().to_string()),
                Some("42501") => DbError::PermissionDenied(db_err.message().to_string()),
                Some("42P01") | Some("42703") => DbError::InvalidRecord(db_err.message().to_string()),
                _ => DbError::Query(err.to_string()),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::Backend(err.to_string())
            }
            other => DbError::Query(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quoting_and_column_lists() {
        let record: Record = json!({"name": "a", "size": 1})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(quote("files"), "\"files\"");
        assert_eq!(column_list(&record), "\"name\", \"size\"");
    }

    #[test]
    fn insert_sql_placeholders() {
        let empty = Record::new();
        let sql = insert_sql("activity_logs", &empty);
        assert!(sql.contains("DEFAULT VALUES"));
        assert!(!sql.contains("$1"));

        let record: Record = json!({"action": "LOGOUT"}).as_object().cloned().unwrap();
        let sql = insert_sql("activity_logs", &record);
        assert!(sql.starts_with("INSERT INTO \"activity_logs\" (\"action\")"));
        assert!(sql.contains("jsonb_populate_record(NULL::\"activity_logs\", $1)"));
    }

    #[test]
    fn sqlx_errors_map_to_db_errors() {
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound(_)
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::Backend(_)
        ));
    }
}
