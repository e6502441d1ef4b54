//! User account and contact view types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection holding user documents.
pub const USERS_COLLECTION: &str = "users";

/// A registered user account.
///
/// `password_hash` holds a salted one-way hash (PHC string). It is never
/// serialized, so neither session snapshots nor API responses carry it.
/// The PascalCase aliases let legacy session snapshots decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Icon URL. Empty until one is assigned.
    #[serde(default, alias = "Icon")]
    pub icon: String,
    #[serde(default, alias = "IsOnline")]
    pub is_online: bool,
    /// `None` when the stored document carried no usable timestamp.
    #[serde(default, alias = "CreatedAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "UpdatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build the contact view of this user.
    pub fn to_contact(&self) -> Contact {
        Contact {
            id: self.id.clone(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            last_seen: self.updated_at,
            is_online: self.is_online,
        }
    }
}

/// Another user as seen by the requester.
///
/// Used both as the counterpart of a conversation and as a discovery
/// candidate for users the requester has not talked to yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub is_online: bool,
}
