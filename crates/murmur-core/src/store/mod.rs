//! Document store port.
//!
//! The engine talks to a schema-less document store through the
//! `DocumentStore` trait. Documents carry no schema and no referential
//! integrity: every consumer must tolerate missing fields, inconsistent key
//! casing, and dangling ids. Implementations live in murmur-infra
//! (`SqliteDocumentStore`); `MemoryDocumentStore` is an in-process
//! implementation for tests and ephemeral servers.

pub mod memory;

use murmur_types::document::{Document, StoredDocument};
use murmur_types::error::StoreError;
use serde_json::Value;

pub use memory::MemoryDocumentStore;

/// Unwrap a JSON object into a document. Non-objects yield an empty one.
pub fn into_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Sort order for ordered scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Trait for schema-less document persistence.
///
/// Collections are addressed by name; subcollections by their parent
/// collection, parent id, and subcollection name. A store client is meant
/// to be long-lived and shared across requests.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait DocumentStore: Send + Sync {
    /// Get a document by id. Returns `None` if it does not exist.
    fn get_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<StoredDocument>, StoreError>> + Send;

    /// All documents whose `field` equals `value`.
    fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> impl std::future::Future<Output = Result<Vec<StoredDocument>, StoreError>> + Send;

    /// All documents whose array-valued `field` contains `value`.
    fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> impl std::future::Future<Output = Result<Vec<StoredDocument>, StoreError>> + Send;

    /// Every document of a collection.
    fn list_all(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<Vec<StoredDocument>, StoreError>> + Send;

    /// Create or replace a document. With `id == None` an id is generated.
    /// Returns the document id.
    fn set_document(
        &self,
        collection: &str,
        id: Option<&str>,
        data: &Document,
    ) -> impl std::future::Future<Output = Result<String, StoreError>> + Send;

    /// Set a single top-level field. Fails with `StoreError::NotFound` if the
    /// document does not exist.
    fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a document. No-op if it does not exist.
    fn delete_document(
        &self,
        collection: &str,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Append a document with a generated id to a subcollection.
    fn add_to_subcollection(
        &self,
        collection: &str,
        parent_id: &str,
        subcollection: &str,
        data: &Document,
    ) -> impl std::future::Future<Output = Result<String, StoreError>> + Send;

    /// All documents of a subcollection ordered by the timestamp field
    /// `order_field`. Documents lacking a parseable value sort first in
    /// ascending order; insertion order breaks ties.
    fn list_subcollection_ordered(
        &self,
        collection: &str,
        parent_id: &str,
        subcollection: &str,
        order_field: &str,
        order: SortOrder,
    ) -> impl std::future::Future<Output = Result<Vec<StoredDocument>, StoreError>> + Send;
}
