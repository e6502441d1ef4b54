//! Authenticated session types.
//!
//! A session document is keyed by its token: the same opaque random value is
//! both the primary key in the `sessions` collection and the credential the
//! client presents in its cookie.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UnauthenticatedReason;
use crate::user::User;

/// Collection holding session documents.
pub const SESSIONS_COLLECTION: &str = "sessions";

/// Default session lifetime in days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// An issued login session.
///
/// `user` is a value snapshot taken at creation (or at the last explicit
/// update). It is not refreshed when the underlying user document changes,
/// so another session of the same user keeps showing the old values until
/// it is re-created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Token")]
    pub token: String,
    #[serde(alias = "User")]
    pub user: User,
    #[serde(alias = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(alias = "ExpiredAt")]
    pub expired_at: DateTime<Utc>,
    #[serde(alias = "IsValid")]
    pub is_valid: bool,
}

impl Session {
    /// Check whether the session may authenticate a request at `now`.
    ///
    /// Expiry is exclusive: a session is already unusable at exactly
    /// `expired_at`. The explicit kill switch wins regardless of remaining
    /// lifetime.
    pub fn check_at(&self, now: DateTime<Utc>) -> Result<(), UnauthenticatedReason> {
        if !self.is_valid {
            return Err(UnauthenticatedReason::Invalidated);
        }
        if now >= self.expired_at {
            return Err(UnauthenticatedReason::Expired);
        }
        Ok(())
    }
}
