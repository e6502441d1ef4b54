//! Tolerant decoding of raw store documents into canonical records.
//!
//! Documents in the store were written over time by code using different
//! key conventions (`created_at` vs `CreatedAt`, `is_read` vs `IsRead`). For
//! every logical field the normalizer tries an ordered list of candidate
//! keys -- snake_case first, then PascalCase -- and falls back to a fixed
//! default when none yields a value of the expected type:
//!
//! | kind      | default                                   |
//! |-----------|-------------------------------------------|
//! | text      | `""`                                      |
//! | boolean   | `false`                                   |
//! | set/list  | empty                                     |
//! | timestamp | `now` for message `created_at`, else None |
//!
//! A key holding a value of the wrong dynamic type counts as absent. The
//! functions here never fail and have no side effects; the list of
//! defaulted fields is returned alongside the record for diagnostics only.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use murmur_types::chat::{ChatRecord, Message};
use murmur_types::document::{Document, StoredDocument};
use murmur_types::error::MalformedDocument;
use murmur_types::user::User;
use serde_json::Value;

/// Candidate keys per logical field, in lookup order.
///
/// The first entry is the canonical key used when writing documents.
pub mod keys {
    pub const ID: &[&str] = &["id", "ID"];
    pub const CHAT_ID: &[&str] = &["chat_id", "ChatID"];
    pub const SENDER_ID: &[&str] = &["sender_id", "SenderID"];
    pub const SENDER_NAME: &[&str] = &["sender_name", "SenderName"];
    pub const CONTENT: &[&str] = &["content", "Content"];
    pub const MEDIA_URL: &[&str] = &["media_url", "MediaURL"];
    pub const CREATED_AT: &[&str] = &["created_at", "CreatedAt"];
    pub const UPDATED_AT: &[&str] = &["updated_at", "UpdatedAt"];
    pub const IS_READ: &[&str] = &["is_read", "IsRead"];
    pub const READ_BY: &[&str] = &["read_by", "ReadBy"];
    pub const REPLY_TO: &[&str] = &["reply_to", "ReplyTo"];

    pub const NAME: &[&str] = &["name", "Name"];
    pub const EMAIL: &[&str] = &["email", "Email"];
    pub const PASSWORD: &[&str] = &["password", "Password"];
    pub const ICON: &[&str] = &["icon", "Icon"];
    pub const IS_ONLINE: &[&str] = &["is_online", "IsOnline"];

    pub const PARTICIPANTS: &[&str] = &["participants", "Participants"];
    // Chat documents were historically written in camelCase as well.
    pub const CHAT_CREATED_AT: &[&str] = &["created_at", "CreatedAt", "createdAt"];
    pub const CHAT_UPDATED_AT: &[&str] = &["updated_at", "UpdatedAt", "updatedAt"];
}

/// A best-effort record plus the logical fields that fell back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub record: T,
    pub defaulted: Vec<&'static str>,
    tracked: usize,
}

impl<T> Normalized<T> {
    /// True when every tracked field had to be defaulted.
    pub fn is_fully_defaulted(&self) -> bool {
        self.tracked > 0 && self.defaulted.len() == self.tracked
    }

    pub fn was_defaulted(&self, field: &str) -> bool {
        self.defaulted.contains(&field)
    }

    /// Diagnostic for a presumably malformed document, if fully defaulted.
    pub fn malformed(&self, kind: &'static str, id: &str) -> Option<MalformedDocument> {
        self.is_fully_defaulted().then(|| MalformedDocument {
            kind,
            id: id.to_string(),
            fields: self.defaulted.clone(),
        })
    }

    pub fn into_record(self) -> T {
        self.record
    }
}

/// Parse a stored timestamp. Only RFC 3339 strings qualify.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Canonical string form for timestamps written by the engine.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Walks candidate keys and records which tracked fields were defaulted.
struct FieldReader<'a> {
    doc: &'a Document,
    defaulted: Vec<&'static str>,
    tracked: usize,
}

impl<'a> FieldReader<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            defaulted: Vec::new(),
            tracked: 0,
        }
    }

    fn lookup<T>(&self, keys: &[&str], extract: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
        keys.iter()
            .filter_map(|k| self.doc.get(*k))
            .find_map(extract)
    }

    fn track<T>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        self.tracked += 1;
        if value.is_none() {
            self.defaulted.push(name);
        }
        value
    }

    fn text(&mut self, name: &'static str, keys: &[&str]) -> String {
        let value = self.lookup(keys, |v| v.as_str().map(str::to_string));
        self.track(name, value).unwrap_or_default()
    }

    fn flag(&mut self, name: &'static str, keys: &[&str]) -> bool {
        let value = self.lookup(keys, Value::as_bool);
        self.track(name, value).unwrap_or(false)
    }

    fn timestamp(&mut self, name: &'static str, keys: &[&str]) -> Option<DateTime<Utc>> {
        let value = self.lookup(keys, parse_timestamp);
        self.track(name, value)
    }

    /// Optional text: absence is normal and not reported.
    fn optional_text(&self, keys: &[&str]) -> Option<String> {
        self.lookup(keys, |v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty())
    }

    /// Array of strings. Any non-string element makes the whole value count
    /// as the wrong type.
    fn string_list(&mut self, name: &'static str, keys: &[&str]) -> Vec<String> {
        let value = self.lookup(keys, |v| {
            v.as_array()?
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        });
        self.track(name, value).unwrap_or_default()
    }

    fn finish<T>(self, record: T) -> Normalized<T> {
        Normalized {
            record,
            defaulted: self.defaulted,
            tracked: self.tracked,
        }
    }
}

/// Prefer the store-assigned id, falling back to an id field in the body.
fn document_id(doc: &StoredDocument) -> String {
    if !doc.id.is_empty() {
        return doc.id.clone();
    }
    keys::ID
        .iter()
        .filter_map(|k| doc.data.get(*k))
        .find_map(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Normalize a message document from the subcollection of `chat_id`.
///
/// A missing `created_at` falls back to `now`. That keeps the record usable
/// but places the message at the time it was read, not written.
pub fn normalize_message(
    doc: &StoredDocument,
    chat_id: &str,
    now: DateTime<Utc>,
) -> Normalized<Message> {
    let mut reader = FieldReader::new(&doc.data);

    let sender_id = reader.text("sender_id", keys::SENDER_ID);
    let sender_name = reader.text("sender_name", keys::SENDER_NAME);
    let content = reader.text("content", keys::CONTENT);
    let created_at = reader.timestamp("created_at", keys::CREATED_AT).unwrap_or(now);
    let is_read = reader.flag("is_read", keys::IS_READ);

    let read_by: BTreeSet<String> = reader
        .lookup(keys::READ_BY, |v| {
            v.as_array()
                .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        })
        .unwrap_or_default();

    let message = Message {
        id: document_id(doc),
        chat_id: reader
            .optional_text(keys::CHAT_ID)
            .unwrap_or_else(|| chat_id.to_string()),
        sender_id,
        sender_name,
        content,
        media_url: reader.optional_text(keys::MEDIA_URL),
        created_at,
        is_read,
        read_by,
        reply_to: reader.optional_text(keys::REPLY_TO),
    };

    reader.finish(message)
}

/// Normalize a user document.
pub fn normalize_user(doc: &StoredDocument) -> Normalized<User> {
    let mut reader = FieldReader::new(&doc.data);

    let user = User {
        id: document_id(doc),
        name: reader.text("name", keys::NAME),
        email: reader.text("email", keys::EMAIL),
        password_hash: reader.text("password", keys::PASSWORD),
        icon: reader.text("icon", keys::ICON),
        is_online: reader.flag("is_online", keys::IS_ONLINE),
        created_at: reader.timestamp("created_at", keys::CREATED_AT),
        updated_at: reader.timestamp("updated_at", keys::UPDATED_AT),
    };

    reader.finish(user)
}

/// Normalize a chat document.
///
/// Participants are kept as stored; arity is validated by the caller.
pub fn normalize_chat(doc: &StoredDocument) -> Normalized<ChatRecord> {
    let mut reader = FieldReader::new(&doc.data);

    let record = ChatRecord {
        id: document_id(doc),
        participants: reader.string_list("participants", keys::PARTICIPANTS),
        created_at: reader.timestamp("created_at", keys::CHAT_CREATED_AT),
        updated_at: reader.timestamp("updated_at", keys::CHAT_UPDATED_AT),
    };

    reader.finish(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn stored(id: &str, value: Value) -> StoredDocument {
        StoredDocument::new(id, value.as_object().cloned().unwrap())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_snake_case_message() {
        let doc = stored(
            "m1",
            json!({
                "sender_id": "alice",
                "sender_name": "Alice",
                "content": "hi",
                "created_at": "2025-05-01T08:30:00Z",
                "is_read": true,
                "read_by": ["bob"],
            }),
        );
        let n = normalize_message(&doc, "c1", now());
        assert!(n.defaulted.is_empty());
        let m = n.into_record();
        assert_eq!(m.id, "m1");
        assert_eq!(m.chat_id, "c1");
        assert_eq!(m.sender_id, "alice");
        assert!(m.is_read);
        assert!(m.read_by.contains("bob"));
        assert_eq!(m.created_at, Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_either_timestamp_casing_yields_same_instant() {
        let snake = stored("m1", json!({"created_at": "2025-05-01T08:30:00+02:00"}));
        let pascal = stored("m2", json!({"CreatedAt": "2025-05-01T06:30:00Z"}));
        let a = normalize_message(&snake, "c1", now()).into_record();
        let b = normalize_message(&pascal, "c1", now()).into_record();
        assert_eq!(a.created_at, b.created_at);
    }

    #[test]
    fn test_snake_case_wins_over_pascal_case() {
        let doc = stored("m1", json!({"content": "snake", "Content": "pascal"}));
        assert_eq!(normalize_message(&doc, "c1", now()).record.content, "snake");
    }

    #[test]
    fn test_missing_read_state_is_false() {
        let doc = stored("m1", json!({"content": "hello"}));
        let n = normalize_message(&doc, "c1", now());
        assert!(!n.record.is_read);
        assert!(n.was_defaulted("is_read"));
    }

    #[test]
    fn test_pascal_case_read_state() {
        let doc = stored("m1", json!({"IsRead": true}));
        assert!(normalize_message(&doc, "c1", now()).record.is_read);
    }

    #[test]
    fn test_wrong_type_treated_as_absent() {
        let doc = stored(
            "m1",
            json!({"is_read": "yes", "IsRead": true, "content": 42, "created_at": 1700000000}),
        );
        let n = normalize_message(&doc, "c1", now());
        // Falls through to the PascalCase key.
        assert!(n.record.is_read);
        assert_eq!(n.record.content, "");
        assert!(n.was_defaulted("content"));
        assert_eq!(n.record.created_at, now());
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let doc = stored("m1", json!({"content": "x"}));
        let n = normalize_message(&doc, "c1", now());
        assert_eq!(n.record.created_at, now());
        assert!(n.was_defaulted("created_at"));
    }

    #[test]
    fn test_fully_defaulted_message_is_malformed() {
        let doc = stored("m1", json!({"unexpected": true}));
        let n = normalize_message(&doc, "c1", now());
        assert!(n.is_fully_defaulted());
        let diag = n.malformed("message", "m1").unwrap();
        assert_eq!(diag.fields.len(), 5);
    }

    #[test]
    fn test_partial_message_is_not_malformed() {
        let doc = stored("m1", json!({"content": "x"}));
        assert!(normalize_message(&doc, "c1", now()).malformed("message", "m1").is_none());
    }

    #[test]
    fn test_empty_optional_fields_are_none() {
        let doc = stored("m1", json!({"media_url": "", "ReplyTo": "m0"}));
        let m = normalize_message(&doc, "c1", now()).into_record();
        assert!(m.media_url.is_none());
        assert_eq!(m.reply_to.as_deref(), Some("m0"));
    }

    #[test]
    fn test_legacy_pascal_case_user() {
        let doc = stored(
            "u1",
            json!({
                "Name": "Bob",
                "Email": "bob@example.com",
                "Password": "$argon2id$...",
                "IsOnline": true,
                "CreatedAt": "2024-01-01T00:00:00Z",
            }),
        );
        let n = normalize_user(&doc);
        let user = n.record;
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Bob");
        assert_eq!(user.email, "bob@example.com");
        assert!(user.is_online);
        assert!(user.created_at.is_some());
        assert!(user.updated_at.is_none());
        assert_eq!(user.icon, "");
    }

    #[test]
    fn test_user_id_falls_back_to_body() {
        let doc = stored("", json!({"ID": "u9"}));
        assert_eq!(normalize_user(&doc).record.id, "u9");
    }

    #[test]
    fn test_chat_camel_case_timestamps() {
        let doc = stored(
            "c1",
            json!({
                "participants": ["a", "b"],
                "createdAt": "2025-01-01T00:00:00Z",
                "updatedAt": "2025-01-02T00:00:00Z",
            }),
        );
        let chat = normalize_chat(&doc).record;
        assert_eq!(chat.participants, vec!["a", "b"]);
        assert_eq!(chat.updated_at, Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_chat_participants_with_non_string_entry_are_absent() {
        let doc = stored("c1", json!({"participants": ["a", 7]}));
        let n = normalize_chat(&doc);
        assert!(n.record.participants.is_empty());
        assert!(n.was_defaulted("participants"));
    }

    #[test]
    fn test_format_timestamp_roundtrips() {
        let t = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let s = format_timestamp(&t);
        assert_eq!(s, "2025-03-04T05:06:07.000000Z");
        assert_eq!(parse_timestamp(&json!(s)), Some(t));
    }
}
