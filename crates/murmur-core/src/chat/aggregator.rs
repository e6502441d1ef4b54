//! Conversation list aggregation.
//!
//! Rebuilds a user's conversation list from loosely-typed chat and message
//! documents. The store gives no referential integrity, so every step
//! tolerates bad data: chats with the wrong arity, duplicate chat documents
//! for the same pair, unreadable message subcollections, and dangling user
//! ids are skipped and logged instead of failing the whole pass.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use murmur_types::chat::{
    CHATS_COLLECTION, Chat, ChatRecord, Message, PARTICIPANTS_FIELD, ParticipantPair,
};
use murmur_types::error::ChatError;
use murmur_types::user::User;
use serde_json::json;
use tracing::{debug, warn};

use super::load_messages;
use crate::clock::Clock;
use crate::normalize::normalize_chat;
use crate::store::DocumentStore;
use crate::user::load_user;

/// A chat that survived filtering, before its counterpart is resolved.
struct Candidate {
    record: ChatRecord,
    other_id: String,
    messages: Vec<Message>,
    last_message_time: DateTime<Utc>,
}

/// Builds per-user conversation lists. Read-only.
pub struct ChatAggregator<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> ChatAggregator<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The conversation list of `user_id`, most recently active first.
    ///
    /// At most one entry per unordered participant pair. When several chat
    /// documents exist for the same pair the most recently active one wins;
    /// on equal activity the first one returned by the store is kept.
    ///
    /// Only a failure of the initial chat query is returned as an error.
    pub async fn conversation_list(&self, user_id: &str) -> Result<Vec<Chat>, ChatError> {
        let docs = self
            .store
            .query_array_contains(CHATS_COLLECTION, PARTICIPANTS_FIELD, &json!(user_id))
            .await?;
        let now = self.clock.now();

        let mut seen_ids = HashSet::new();
        let mut order: Vec<ParticipantPair> = Vec::new();
        let mut by_pair: HashMap<ParticipantPair, Candidate> = HashMap::new();

        for doc in &docs {
            let normalized = normalize_chat(doc);
            if let Some(diag) = normalized.malformed("chat", &doc.id) {
                warn!(%diag, "chat document presumably malformed");
            }
            let record = normalized.into_record();

            let Some(pair) = record.pair() else {
                warn!(
                    chat_id = %record.id,
                    participants = record.participants.len(),
                    "skipping chat without exactly two participants"
                );
                continue;
            };
            let Some(other_id) = pair.other(user_id).map(str::to_string) else {
                debug!(chat_id = %record.id, "user is not a participant, skipping");
                continue;
            };
            if other_id.is_empty() || other_id == user_id {
                warn!(chat_id = %record.id, "skipping chat without a counterpart");
                continue;
            }
            if !seen_ids.insert(record.id.clone()) {
                debug!(chat_id = %record.id, "chat already seen in this pass");
                continue;
            }

            let messages = match load_messages(self.store.as_ref(), &record.id, now).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(
                        chat_id = %record.id,
                        error = %e,
                        "failed to load messages, skipping chat"
                    );
                    continue;
                }
            };
            let last_message_time = last_activity(&record, &messages);

            let candidate = Candidate {
                record,
                other_id,
                messages,
                last_message_time,
            };
            match by_pair.get(&pair) {
                Some(existing) => {
                    debug!(
                        kept = %existing.record.id,
                        duplicate = %candidate.record.id,
                        "duplicate chat for participant pair"
                    );
                    if candidate.last_message_time > existing.last_message_time {
                        by_pair.insert(pair, candidate);
                    }
                }
                None => {
                    order.push(pair.clone());
                    by_pair.insert(pair, candidate);
                }
            }
        }

        let mut users: HashMap<String, Option<User>> = HashMap::new();
        let mut chats = Vec::with_capacity(order.len());

        for pair in order {
            let Some(candidate) = by_pair.remove(&pair) else {
                continue;
            };
            let Some(other) = self.resolve_user(&mut users, &candidate.other_id).await else {
                continue;
            };

            chats.push(Chat {
                id: candidate.record.id,
                is_group: false,
                contact: other.to_contact(),
                messages: candidate.messages,
                created_at: candidate.record.created_at,
                last_message_time: candidate.last_message_time,
            });
        }

        chats.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(chats)
    }

    /// User lookup memoized for the duration of one pass. Failures and
    /// missing users resolve to `None` and are logged once.
    async fn resolve_user(
        &self,
        cache: &mut HashMap<String, Option<User>>,
        user_id: &str,
    ) -> Option<User> {
        if let Some(cached) = cache.get(user_id) {
            return cached.clone();
        }
        let resolved = match load_user(self.store.as_ref(), user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                warn!(user_id = %user_id, "chat counterpart does not exist, skipping");
                None
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "failed to load chat counterpart, skipping");
                None
            }
        };
        cache.insert(user_id.to_string(), resolved.clone());
        resolved
    }
}

/// Newest message time; for an empty chat its own `updated_at`, then
/// `created_at`, then the minimum instant so it sorts last.
fn last_activity(record: &ChatRecord, messages: &[Message]) -> DateTime<Utc> {
    messages
        .iter()
        .map(|m| m.created_at)
        .max()
        .or(record.updated_at)
        .or(record.created_at)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
