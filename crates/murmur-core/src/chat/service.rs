//! Chat service: starting chats, sending, reading, and acknowledging
//! messages.

use std::sync::Arc;

use murmur_types::chat::{
    CHATS_COLLECTION, ChatRecord, MESSAGES_SUBCOLLECTION, Message, PARTICIPANTS_FIELD,
    ParticipantPair,
};
use murmur_types::document::subcollection_path;
use murmur_types::error::ChatError;
use murmur_types::user::User;
use serde_json::json;
use tracing::{debug, info};

use super::{load_chat, load_messages};
use crate::clock::Clock;
use crate::normalize::{format_timestamp, keys, normalize_chat};
use crate::store::{DocumentStore, into_document};
use crate::user::load_user;

/// Write side of conversations plus the participant-checked message read.
pub struct ChatService<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> ChatService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Open a chat between `user_id` and `target_id`, returning its id.
    ///
    /// Reuses the existing chat for the pair if there is one.
    pub async fn start_chat(&self, user_id: &str, target_id: &str) -> Result<String, ChatError> {
        let target_id = target_id.trim();
        if target_id.is_empty() {
            return Err(ChatError::Validation("target user is required".to_string()));
        }
        if target_id == user_id {
            return Err(ChatError::Validation("cannot start a chat with yourself".to_string()));
        }
        if load_user(self.store.as_ref(), target_id).await?.is_none() {
            return Err(ChatError::NotFound("user".to_string()));
        }

        let pair = ParticipantPair::new(user_id, target_id);
        let existing = self
            .store
            .query_array_contains(CHATS_COLLECTION, PARTICIPANTS_FIELD, &json!(user_id))
            .await?;
        if let Some(chat) = existing
            .iter()
            .map(|doc| normalize_chat(doc).into_record())
            .find(|record| record.pair().as_ref() == Some(&pair))
        {
            debug!(chat_id = %chat.id, "reusing existing chat");
            return Ok(chat.id);
        }

        let now = format_timestamp(&self.clock.now());
        let data = into_document(json!({
            "participants": [user_id, target_id],
            "created_at": now,
            "updated_at": now,
        }));
        let chat_id = self.store.set_document(CHATS_COLLECTION, None, &data).await?;
        info!(chat_id = %chat_id, "chat started");
        Ok(chat_id)
    }

    /// Append a message from `sender` and bump the chat's `updated_at`.
    pub async fn send_message(
        &self,
        chat_id: &str,
        sender: &User,
        content: &str,
    ) -> Result<Message, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::Validation("message content is empty".to_string()));
        }
        self.participant_chat(chat_id, &sender.id).await?;

        let now = self.clock.now();
        let stamp = format_timestamp(&now);
        let data = into_document(json!({
            "chat_id": chat_id,
            "sender_id": sender.id,
            "sender_name": sender.name,
            "content": content,
            "created_at": stamp,
            "is_read": false,
            "read_by": [],
        }));
        let id = self
            .store
            .add_to_subcollection(CHATS_COLLECTION, chat_id, MESSAGES_SUBCOLLECTION, &data)
            .await?;
        self.store
            .update_field(CHATS_COLLECTION, chat_id, keys::UPDATED_AT[0], &json!(stamp))
            .await?;

        Ok(Message {
            id,
            chat_id: chat_id.to_string(),
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            content: content.to_string(),
            media_url: None,
            created_at: now,
            is_read: false,
            read_by: Default::default(),
            reply_to: None,
        })
    }

    /// Messages of a chat the viewer participates in, ascending by time.
    pub async fn get_messages(
        &self,
        chat_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<Message>, ChatError> {
        self.participant_chat(chat_id, viewer_id).await?;
        Ok(load_messages(self.store.as_ref(), chat_id, self.clock.now()).await?)
    }

    /// Mark every message from the other side as read by `viewer_id`.
    /// Returns how many messages changed.
    pub async fn mark_read(&self, chat_id: &str, viewer_id: &str) -> Result<usize, ChatError> {
        self.participant_chat(chat_id, viewer_id).await?;
        let messages = load_messages(self.store.as_ref(), chat_id, self.clock.now()).await?;
        let path = subcollection_path(CHATS_COLLECTION, chat_id, MESSAGES_SUBCOLLECTION);

        let mut changed = 0;
        for message in messages
            .into_iter()
            .filter(|m| m.sender_id != viewer_id && !m.read_by.contains(viewer_id))
        {
            let mut read_by = message.read_by;
            read_by.insert(viewer_id.to_string());
            self.store
                .update_field(&path, &message.id, keys::IS_READ[0], &json!(true))
                .await?;
            self.store
                .update_field(&path, &message.id, keys::READ_BY[0], &json!(read_by))
                .await?;
            changed += 1;
        }
        debug!(chat_id = %chat_id, changed, "messages marked read");
        Ok(changed)
    }

    async fn participant_chat(
        &self,
        chat_id: &str,
        user_id: &str,
    ) -> Result<ChatRecord, ChatError> {
        let chat = load_chat(self.store.as_ref(), chat_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("chat".to_string()))?;
        if !chat.participants.iter().any(|p| p == user_id) {
            return Err(ChatError::NotParticipant);
        }
        Ok(chat)
    }
}
