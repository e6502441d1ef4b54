//! In-process document store.
//!
//! Backs `murmur serve --in-memory` and the engine's unit tests. Data lives
//! in a `RwLock`-guarded map and is lost when the process exits.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use murmur_types::document::{Document, StoredDocument, subcollection_path};
use murmur_types::error::StoreError;
use serde_json::Value;
use uuid::Uuid;

use super::{DocumentStore, SortOrder};
use crate::normalize::parse_timestamp;

/// `DocumentStore` held entirely in memory.
///
/// Documents keep their insertion order within a collection so ordered
/// scans have a deterministic tie-break.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
    failing: RwLock<HashSet<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call touching `collection` fail with a backend error.
    ///
    /// Simulates an unreachable store for a single collection path
    /// (e.g. `users` or `chats/c1/messages`).
    pub fn fail_collection(&self, collection: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(collection.to_string());
        }
    }

    /// Undo `fail_collection`.
    pub fn heal_collection(&self, collection: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.remove(collection);
        }
    }

    fn check(&self, collection: &str) -> Result<(), StoreError> {
        let failing = self
            .failing
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        if failing.contains(collection) {
            return Err(StoreError::Backend(format!(
                "collection '{collection}' unavailable"
            )));
        }
        Ok(())
    }

    fn read<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&[StoredDocument]) -> T,
    ) -> Result<T, StoreError> {
        self.check(collection)?;
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        let docs = collections.get(collection).map(Vec::as_slice).unwrap_or(&[]);
        Ok(f(docs))
    }

    fn write<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Vec<StoredDocument>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.check(collection)?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        f(collections.entry(collection.to_string()).or_default())
    }

    fn upsert(&self, collection: &str, id: String, data: &Document) -> Result<String, StoreError> {
        self.write(collection, |docs| {
            match docs.iter_mut().find(|d| d.id == id) {
                Some(existing) => existing.data = data.clone(),
                None => docs.push(StoredDocument::new(id.clone(), data.clone())),
            }
            Ok(id)
        })
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn get_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredDocument>, StoreError> {
        self.read(collection, |docs| docs.iter().find(|d| d.id == id).cloned())
    }

    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.read(collection, |docs| {
            docs.iter()
                .filter(|d| d.get(field) == Some(value))
                .cloned()
                .collect()
        })
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.read(collection, |docs| {
            docs.iter()
                .filter(|d| {
                    d.get(field)
                        .and_then(Value::as_array)
                        .is_some_and(|items| items.contains(value))
                })
                .cloned()
                .collect()
        })
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        self.read(collection, |docs| docs.to_vec())
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
        self.upsert(collection, id, data)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        self.write(collection, |docs| {
            let doc = docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            doc.data.insert(field.to_string(), value.clone());
            Ok(())
        })
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.write(collection, |docs| {
            docs.retain(|d| d.id != id);
            Ok(())
        })
    }

    async fn add_to_subcollection(
        &self,
        collection: &str,
        parent_id: &str,
        subcollection: &str,
        data: &Document,
    ) -> Result<String, StoreError> {
        let path = subcollection_path(collection, parent_id, subcollection);
        self.upsert(&path, Uuid::now_v7().to_string(), data)
    }

    async fn list_subcollection_ordered(
        &self,
        collection: &str,
        parent_id: &str,
        subcollection: &str,
        order_field: &str,
        order: SortOrder,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let path = subcollection_path(collection, parent_id, subcollection);
        let mut docs = self.read(&path, |docs| docs.to_vec())?;
        // Stable sort: equal keys keep insertion order.
        docs.sort_by_key(|d| d.get(order_field).and_then(parse_timestamp));
        if order == SortOrder::Desc {
            docs.reverse();
        }
        Ok(docs)
    }
}
