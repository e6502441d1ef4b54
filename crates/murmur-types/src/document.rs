//! Raw documents as returned by the schema-less store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field map of a stored document.
pub type Document = Map<String, Value>;

/// A document together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, data: Document) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Path of a subcollection nested under a parent document,
/// e.g. `chats/{id}/messages`.
pub fn subcollection_path(collection: &str, parent_id: &str, subcollection: &str) -> String {
    format!("{collection}/{parent_id}/{subcollection}")
}
