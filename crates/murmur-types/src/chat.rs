//! Chat, message, and conversation view types for Murmur.
//!
//! Chats are stored as loosely-typed documents in the `chats` collection,
//! with messages in a `messages` subcollection under each chat. The types
//! here are the canonical records produced after normalization, plus the
//! read-only conversation view handed to the presentation layer.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::Contact;

/// Collection holding chat documents.
pub const CHATS_COLLECTION: &str = "chats";

/// Subcollection (under each chat) holding message documents.
pub const MESSAGES_SUBCOLLECTION: &str = "messages";

/// Field on chat documents listing the participant user ids.
pub const PARTICIPANTS_FIELD: &str = "participants";

/// Field messages are ordered by within their subcollection.
pub const MESSAGE_ORDER_FIELD: &str = "created_at";

/// A single message within a chat.
///
/// Messages are append-only; only `is_read` and `read_by` change after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub read_by: BTreeSet<String>,
    pub reply_to: Option<String>,
}

/// Canonical form of a chat document.
///
/// `participants` is kept exactly as stored (order and arity included) so
/// the aggregator can reject documents that are not two-party chats.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRecord {
    pub id: String,
    pub participants: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ChatRecord {
    /// The unordered participant pair, if this is a two-party chat.
    pub fn pair(&self) -> Option<ParticipantPair> {
        match self.participants.as_slice() {
            [a, b] => Some(ParticipantPair::new(a, b)),
            _ => None,
        }
    }
}

/// Unordered pair of participant ids.
///
/// Constructed with the two ids sorted so `(a, b)` and `(b, a)` compare
/// and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantPair(String, String);

impl ParticipantPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.0 == user_id || self.1 == user_id
    }

    /// The participant that is not `user_id`.
    ///
    /// Returns `None` if `user_id` is not part of the pair. A self-chat
    /// (both ids equal) yields the user itself.
    pub fn other(&self, user_id: &str) -> Option<&str> {
        if self.0 == user_id {
            Some(&self.1)
        } else if self.1 == user_id {
            Some(&self.0)
        } else {
            None
        }
    }
}

/// One entry of a user's conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    /// Placeholder for group chats. Always `false`: only two-party chats are
    /// surfaced.
    pub is_group: bool,
    /// The other participant.
    pub contact: Contact,
    /// Messages ascending by creation time.
    pub messages: Vec<Message>,
    pub created_at: Option<DateTime<Utc>>,
    /// Creation time of the newest message, or the chat's own `updated_at`
    /// when it has no messages.
    pub last_message_time: DateTime<Utc>,
}
