//! Contact candidate resolution.
//!
//! Candidates are every user except the requester and the users the
//! requester already has a chat with, newest accounts first. Derived by
//! exclusion over the full user set; not paginated.

use std::collections::HashSet;
use std::sync::Arc;

use murmur_types::chat::{CHATS_COLLECTION, PARTICIPANTS_FIELD};
use murmur_types::error::ChatError;
use murmur_types::user::{Contact, USERS_COLLECTION, User};
use serde_json::json;
use tracing::{debug, warn};

use crate::normalize::{normalize_chat, normalize_user};
use crate::store::DocumentStore;

pub struct ContactResolver<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> ContactResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Users `user_id` could start a chat with.
    ///
    /// `search` narrows the set to names containing the term, ignoring
    /// case. A blank term is the same as none. Users without a usable
    /// creation time sort last.
    pub async fn candidates(
        &self,
        user_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<Contact>, ChatError> {
        let term = search
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut users: Vec<User> = self
            .store
            .list_all(USERS_COLLECTION)
            .await?
            .iter()
            .map(|doc| {
                let normalized = normalize_user(doc);
                if let Some(diag) = normalized.malformed("user", &doc.id) {
                    warn!(%diag, "user document presumably malformed");
                }
                normalized.into_record()
            })
            .filter(|user| {
                term.as_ref()
                    .is_none_or(|t| user.name.to_lowercase().contains(t.as_str()))
            })
            .collect();

        let chatted = self.chatted_with(user_id).await?;
        users.retain(|user| user.id != user_id && !chatted.contains(&user.id));
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(
            user_id = %user_id,
            candidates = users.len(),
            excluded = chatted.len(),
            "resolved contact candidates"
        );
        Ok(users.iter().map(User::to_contact).collect())
    }

    /// Ids of everyone sharing a chat with `user_id`, excluding the user.
    async fn chatted_with(&self, user_id: &str) -> Result<HashSet<String>, ChatError> {
        let chats = self
            .store
            .query_array_contains(CHATS_COLLECTION, PARTICIPANTS_FIELD, &json!(user_id))
            .await?;
        Ok(chats
            .iter()
            .flat_map(|doc| normalize_chat(doc).into_record().participants)
            .filter(|id| id != user_id)
            .collect())
    }
}
