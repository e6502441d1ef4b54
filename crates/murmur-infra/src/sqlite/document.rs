//! SQLite document store implementation.
//!
//! Implements `DocumentStore` from `murmur-core` on a single `documents`
//! table. Bodies are JSON text; field access goes through SQLite's JSON1
//! functions. Subcollections live under their path (`chats/{id}/messages`)
//! as the collection name.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use murmur_core::store::{DocumentStore, SortOrder};
use murmur_types::document::{Document, StoredDocument, subcollection_path};
use murmur_types::error::StoreError;
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `DocumentStore`.
///
/// Every call is bounded by `timeout`; an elapsed call fails with
/// `StoreError::Timeout` rather than returning partial data.
pub struct SqliteDocumentStore {
    pool: DatabasePool,
    timeout: Duration,
}

impl SqliteDocumentStore {
    pub fn new(pool: DatabasePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn timed<T>(
        &self,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| StoreError::Backend(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn fetch(&self, sql: &str, binds: &[String]) -> Result<Vec<StoredDocument>, StoreError> {
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(bind.as_str());
        }
        let rows = self.timed(query.fetch_all(&self.pool.reader)).await?;
        rows.iter()
            .map(|row| {
                DocumentRow::from_row(row)
                    .map_err(|e| StoreError::Backend(e.to_string()))?
                    .into_document()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct DocumentRow {
    id: String,
    data: String,
}

impl DocumentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            data: row.try_get("data")?,
        })
    }

    fn into_document(self) -> Result<StoredDocument, StoreError> {
        let data: Document = serde_json::from_str(&self.data)
            .map_err(|e| StoreError::Encoding(format!("document '{}': {e}", self.id)))?;
        Ok(StoredDocument::new(self.id, data))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// JSON path for a top-level field, quoted so any key is addressable.
fn field_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Encoding(e.to_string()))
}

fn now_string() -> String {
    Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// DocumentStore implementation
// ---------------------------------------------------------------------------

impl DocumentStore for SqliteDocumentStore {
    async fn get_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let row = self
            .timed(
                sqlx::query("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
                    .bind(collection)
                    .bind(id)
                    .fetch_optional(&self.pool.reader),
            )
            .await?;

        match row {
            Some(row) => DocumentRow::from_row(&row)
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .into_document()
                .map(Some),
            None => Ok(None),
        }
    }

    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.fetch(
            r#"SELECT id, data FROM documents
               WHERE collection = ? AND json_extract(data, ?) = json_extract(?, '$')
               ORDER BY seq"#,
            &[collection.to_string(), field_path(field), encode(value)?],
        )
        .await
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let path = field_path(field);
        self.fetch(
            r#"SELECT d.id, d.data FROM documents d
               WHERE d.collection = ?
                 AND json_type(d.data, ?) = 'array'
                 AND EXISTS (
                     SELECT 1 FROM json_each(d.data, ?) je
                     WHERE je.value = json_extract(?, '$')
                 )
               ORDER BY d.seq"#,
            &[collection.to_string(), path.clone(), path, encode(value)?],
        )
        .await
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        self.fetch(
            "SELECT id, data FROM documents WHERE collection = ? ORDER BY seq",
            &[collection.to_string()],
        )
        .await
    }

    async fn set_document(
        &self,
        collection: &str,
        id: Option<&str>,
        data: &Document,
    ) -> Result<String, StoreError> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let body = encode(data)?;
        let now = now_string();

        // Upsert keeps `seq`, so replaced documents hold their position.
        self.timed(
            sqlx::query(
                r#"INSERT INTO documents (collection, id, data, created_at, updated_at)
                   VALUES (?, ?, ?, ?, ?)
                   ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at"#,
            )
            .bind(collection)
            .bind(&id)
            .bind(&body)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool.writer),
        )
        .await?;

        Ok(id)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        let result = self
            .timed(
                sqlx::query(
                    "UPDATE documents SET data = json_set(data, ?, json(?)), updated_at = ? WHERE collection = ? AND id = ?",
                )
                .bind(field_path(field))
                .bind(encode(value)?)
                .bind(now_string())
                .bind(collection)
                .bind(id)
                .execute(&self.pool.writer),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.timed(
            sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .execute(&self.pool.writer),
        )
        .await?;
        Ok(())
    }

    async fn add_to_subcollection(
        &self,
        collection: &str,
        parent_id: &str,
        subcollection: &str,
        data: &Document,
    ) -> Result<String, StoreError> {
        let path = subcollection_path(collection, parent_id, subcollection);
        self.set_document(&path, None, data).await
    }

    async fn list_subcollection_ordered(
        &self,
        collection: &str,
        parent_id: &str,
        subcollection: &str,
        order_field: &str,
        order: SortOrder,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        // Fractional seconds vary in width, so compare as julian days rather
        // than as text. Missing or unparseable values are NULL and sort first.
        let sql = match order {
            SortOrder::Asc => {
                "SELECT id, data FROM documents WHERE collection = ? ORDER BY julianday(json_extract(data, ?)) ASC, seq ASC"
            }
            SortOrder::Desc => {
                "SELECT id, data FROM documents WHERE collection = ? ORDER BY julianday(json_extract(data, ?)) DESC, seq DESC"
            }
        };
        let path = subcollection_path(collection, parent_id, subcollection);
        self.fetch(sql, &[path, field_path(order_field)]).await
    }
}
