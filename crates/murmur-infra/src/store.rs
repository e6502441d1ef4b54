//! Runtime choice of document store backend.
//!
//! `DocumentStore` uses native async fn in traits and is not object-safe, so
//! the binary picks its backend through this enum instead of a trait object.

use murmur_core::store::{DocumentStore, MemoryDocumentStore, SortOrder};
use murmur_types::document::{Document, StoredDocument};
use murmur_types::error::StoreError;
use serde_json::Value;

use crate::sqlite::document::SqliteDocumentStore;

pub enum DocumentBackend {
    Sqlite(SqliteDocumentStore),
    Memory(MemoryDocumentStore),
}

impl DocumentBackend {
    pub fn name(&self) -> &'static str {
        match self {
            DocumentBackend::Sqlite(_) => "sqlite",
            DocumentBackend::Memory(_) => "memory",
        }
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident($($arg:expr),*)) => {
        match $self {
            DocumentBackend::Sqlite(store) => store.$method($($arg),*).await,
            DocumentBackend::Memory(store) => store.$method($($arg),*).await,
        }
    };
}

impl DocumentStore for DocumentBackend {
    async fn get_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredDocument>, StoreError> {
        delegate!(self, get_by_id(collection, id))
    }

    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        delegate!(self, query_equals(collection, field, value))
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        delegate!(self, query_array_contains(collection, field, value))
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        delegate!(self, list_all(collection))
    }

    async fn set_document(
        &self,
        collection: &str,
        id: Option<&str>,
        data: &Document,
    ) -> Result<String, StoreError> {
        delegate!(self, set_document(collection, id, data))
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        delegate!(self, update_field(collection, id, field, value))
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        delegate!(self, delete_document(collection, id))
    }

    async fn add_to_subcollection(
        &self,
        collection: &str,
        parent_id: &str,
        subcollection: &str,
        data: &Document,
    ) -> Result<String, StoreError> {
        delegate!(self, add_to_subcollection(collection, parent_id, subcollection, data))
    }

    async fn list_subcollection_ordered(
        &self,
        collection: &str,
        parent_id: &str,
        subcollection: &str,
        order_field: &str,
        order: SortOrder,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        delegate!(
            self,
            list_subcollection_ordered(collection, parent_id, subcollection, order_field, order)
        )
    }
}
