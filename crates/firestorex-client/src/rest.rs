//! Table access over the hosted REST API (`/rest/v1/{table}`).

use async_trait::async_trait;
use firestorex_db::traits::check_names;
use firestorex_db::{DbError, DbResult, Filters, Record, RelationalStore};
use reqwest::Method;
use serde_json::Value;

use crate::BackendClient;

const RETURN_REPRESENTATION: &str = "return=representation";
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=representation";

/// [`RelationalStore`] backed by the hosted REST API.
#[derive(Clone)]
pub struct RestStore {
    client: BackendClient,
}

impl RestStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn table_path(table: &str) -> String {
        format!("/rest/v1/{}", table)
    }
}

/// Render a filter value as an `eq.` operand.
fn eq_operand(value: &Value) -> String {
    match value {
        Value::String(s) => format!("eq.{}", s),
        Value::Null => "is.null".to_string(),
        other => format!("eq.{}", other),
    }
}

fn filter_query(filters: &Filters) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(column, value)| (column.clone(), eq_operand(value)))
        .collect()
}

fn first_row(rows: Vec<Record>) -> DbResult<Record> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::NotFound("no row returned".to_string()))
}

#[async_trait]
impl RelationalStore for RestStore {
    #[tracing::instrument(skip(self, record), fields(db.table = %table, db.operation = "insert"))]
    async fn insert(&self, table: &str, record: Record) -> DbResult<Record> {
        check_names(table, record.keys())?;
        let request = self
            .client
            .request(Method::POST, &Self::table_path(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&Value::Object(record));

        let rows: Vec<Record> = self.client.send_json(request).await?;
        first_row(rows)
    }

    #[tracing::instrument(skip(self, filters), fields(db.table = %table, db.operation = "select"))]
    async fn select(&self, table: &str, filters: &Filters) -> DbResult<Vec<Record>> {
        check_names(table, filters.keys())?;
        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(filter_query(filters));

        let request = self
            .client
            .request(Method::GET, &Self::table_path(table))
            .query(&query);

        Ok(self.client.send_json(request).await?)
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = %table, db.operation = "update", db.record_id = %id))]
    async fn update(&self, table: &str, id: &str, patch: Record) -> DbResult<Vec<Record>> {
        check_names(table, patch.keys())?;
        let request = self
            .client
            .request(Method::PATCH, &Self::table_path(table))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&Value::Object(patch));

        Ok(self.client.send_json(request).await?)
    }

    #[tracing::instrument(skip(self), fields(db.table = %table, db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, table: &str, id: &str) -> DbResult<()> {
        check_names(table, std::iter::empty())?;
        let request = self
            .client
            .request(Method::DELETE, &Self::table_path(table))
            .query(&[("id", format!("eq.{}", id))]);

        self.client.send(request).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, record), fields(db.table = %table, db.operation = "upsert"))]
    async fn upsert(&self, table: &str, record: Record) -> DbResult<Record> {
        check_names(table, record.keys())?;
        if !record.contains_key("id") {
            return Err(DbError::InvalidRecord("upsert requires an id".to_string()));
        }
        let request = self
            .client
            .request(Method::POST, &Self::table_path(table))
            .header("Prefer", UPSERT_PREFERENCE)
            .json(&Value::Object(record));

        let rows: Vec<Record> = self.client.send_json(request).await?;
        first_row(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_operands() {
        assert_eq!(eq_operand(&json!("u1")), "eq.u1");
        assert_eq!(eq_operand(&json!(42)), "eq.42");
        assert_eq!(eq_operand(&json!(true)), "eq.true");
        assert_eq!(eq_operand(&Value::Null), "is.null");
    }

    #[test]
    fn filters_become_query_pairs() {
        let mut filters = Filters::new();
        filters.insert("user_id".to_string(), json!("u1"));
        filters.insert("name".to_string(), json!("a.pdf"));

        assert_eq!(
            filter_query(&filters),
            vec![
                ("name".to_string(), "eq.a.pdf".to_string()),
                ("user_id".to_string(), "eq.u1".to_string()),
            ]
        );
    }
}
