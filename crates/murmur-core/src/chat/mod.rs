//! Conversations: the per-user conversation list and message streams.

pub mod aggregator;
pub mod service;

use chrono::{DateTime, Utc};
use murmur_types::chat::{
    CHATS_COLLECTION, ChatRecord, MESSAGE_ORDER_FIELD, MESSAGES_SUBCOLLECTION, Message,
};
use murmur_types::error::StoreError;
use tracing::warn;

use crate::normalize::{normalize_chat, normalize_message};
use crate::store::{DocumentStore, SortOrder};

pub use aggregator::ChatAggregator;
pub use service::ChatService;

/// Fetch and normalize a chat document. `Ok(None)` when it does not exist.
pub(crate) async fn load_chat<S: DocumentStore>(
    store: &S,
    chat_id: &str,
) -> Result<Option<ChatRecord>, StoreError> {
    let Some(doc) = store.get_by_id(CHATS_COLLECTION, chat_id).await? else {
        return Ok(None);
    };
    let normalized = normalize_chat(&doc);
    if let Some(diag) = normalized.malformed("chat", &doc.id) {
        warn!(%diag, "chat document presumably malformed");
    }
    Ok(Some(normalized.into_record()))
}

/// All messages of a chat, normalized, ascending by creation time.
///
/// The store orders by the canonical timestamp key only; documents written
/// with a legacy key are put in place by a stable re-sort here.
pub(crate) async fn load_messages<S: DocumentStore>(
    store: &S,
    chat_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Message>, StoreError> {
    let docs = store
        .list_subcollection_ordered(
            CHATS_COLLECTION,
            chat_id,
            MESSAGES_SUBCOLLECTION,
            MESSAGE_ORDER_FIELD,
            SortOrder::Asc,
        )
        .await?;

    let mut messages: Vec<Message> = docs
        .iter()
        .map(|doc| {
            let normalized = normalize_message(doc, chat_id, now);
            if let Some(diag) = normalized.malformed("message", &doc.id) {
                warn!(chat_id = %chat_id, %diag, "message document presumably malformed");
            }
            normalized.into_record()
        })
        .collect();
    messages.sort_by_key(|m| m.created_at);
    Ok(messages)
}
