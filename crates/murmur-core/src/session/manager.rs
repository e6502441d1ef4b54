//! Session manager.
//!
//! Owns the `sessions` collection. A session document is keyed by its
//! token and embeds a value snapshot of the user taken at creation (or at
//! the last explicit update). Expiry is a fixed horizon from creation and
//! is never extended by use.

use std::sync::Arc;

use chrono::Duration;
use murmur_types::error::{SessionError, StoreError, UnauthenticatedReason};
use murmur_types::session::{SESSIONS_COLLECTION, Session};
use murmur_types::user::{USERS_COLLECTION, User};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::session::token::TokenGenerator;
use crate::store::DocumentStore;

/// Field flipped on the user document when a session authenticates.
const ONLINE_FIELD: &str = "is_online";

/// Issues, validates, refreshes, and deletes sessions.
///
/// Generic over the document store and token source; murmur-core never
/// depends on murmur-infra.
pub struct SessionManager<S: DocumentStore, T: TokenGenerator> {
    store: Arc<S>,
    tokens: T,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<S: DocumentStore + 'static, T: TokenGenerator> SessionManager<S, T> {
    pub fn new(store: Arc<S>, tokens: T, clock: Arc<dyn Clock>, ttl_days: i64) -> Self {
        Self {
            store,
            tokens,
            clock,
            ttl: Duration::days(ttl_days),
        }
    }

    /// Issue a new session for `user`.
    ///
    /// The token doubles as document id, so exactly one document exists
    /// per issued token.
    pub async fn create_session(&self, user: &User) -> Result<Session, SessionError> {
        let token = self.tokens.generate()?;
        let now = self.clock.now();

        let session = Session {
            id: token.clone(),
            token,
            user: user.clone(),
            created_at: now,
            updated_at: now,
            expired_at: now + self.ttl,
            is_valid: true,
        };

        self.persist(&session).await?;
        info!(user_id = %user.id, expires = %session.expired_at, "session created");
        Ok(session)
    }

    /// Resolve a presented token to its session.
    ///
    /// Fails with `Unauthenticated` when the token is empty or unknown, the
    /// document cannot be decoded, the session was invalidated, or
    /// `now >= expired_at`. On success the user is marked online in the
    /// background; that update is never awaited and its failure is only
    /// logged.
    pub async fn validate_session(&self, token: &str) -> Result<Session, SessionError> {
        let session = self.resolve_session(token).await?;
        self.mark_online(&session.user.id);
        Ok(session)
    }

    /// Same checks as [`validate_session`](Self::validate_session) without
    /// the online side effect. Logout uses this so no pending online write
    /// can land after the user is marked offline.
    pub async fn resolve_session(&self, token: &str) -> Result<Session, SessionError> {
        if token.is_empty() {
            return Err(SessionError::Unauthenticated(UnauthenticatedReason::Missing));
        }

        let doc = self
            .store
            .get_by_id(SESSIONS_COLLECTION, token)
            .await?
            .ok_or(SessionError::Unauthenticated(UnauthenticatedReason::Missing))?;

        let session: Session = serde_json::from_value(Value::Object(doc.data)).map_err(|e| {
            warn!(error = %e, "stored session could not be decoded");
            SessionError::Unauthenticated(UnauthenticatedReason::Corrupt)
        })?;

        if let Err(reason) = session.check_at(self.clock.now()) {
            debug!(user_id = %session.user.id, %reason, "session rejected");
            return Err(SessionError::Unauthenticated(reason));
        }
        Ok(session)
    }

    /// Re-persist a session after its snapshot changed.
    ///
    /// The token stays the same; the returned session carries it so the
    /// caller can re-issue the cookie.
    pub async fn update_session(&self, mut session: Session) -> Result<Session, SessionError> {
        session.updated_at = self.clock.now();
        self.persist(&session).await?;
        debug!(user_id = %session.user.id, "session updated");
        Ok(session)
    }

    /// Remove a session. Deleting an unknown token is not an error.
    pub async fn delete_session(&self, token: &str) -> Result<(), SessionError> {
        self.store.delete_document(SESSIONS_COLLECTION, token).await?;
        Ok(())
    }

    /// Best-effort `is_online = true` on the user document.
    ///
    /// Unordered with respect to other writes; last write wins.
    pub fn mark_online(&self, user_id: &str) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = store
                .update_field(USERS_COLLECTION, &user_id, ONLINE_FIELD, &Value::Bool(true))
                .await
            {
                warn!(user_id = %user_id, error = %e, "failed to mark user online");
            }
        })
    }

    async fn persist(&self, session: &Session) -> Result<(), SessionError> {
        let data = match serde_json::to_value(session) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(StoreError::Encoding("session is not an object".to_string()).into());
            }
            Err(e) => return Err(StoreError::Encoding(e.to_string()).into()),
        };
        self.store
            .set_document(SESSIONS_COLLECTION, Some(&session.token), &data)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_user;
    use crate::store::MemoryDocumentStore;
    use crate::test_support::{ManualClock, SequentialTokens, doc, sample_user, t0};
    use serde_json::json;

    fn manager(
        store: Arc<MemoryDocumentStore>,
        clock: Arc<ManualClock>,
    ) -> SessionManager<MemoryDocumentStore, SequentialTokens> {
        SessionManager::new(store, SequentialTokens::default(), clock, 30)
    }

    async fn seed_user(store: &MemoryDocumentStore, id: &str) -> User {
        store
            .set_document(
                USERS_COLLECTION,
                Some(id),
                &doc(json!({"name": "Aiko", "email": "aiko@example.com", "is_online": false})),
            )
            .await
            .unwrap();
        sample_user(id, "Aiko")
    }

    async fn is_online(store: &MemoryDocumentStore, id: &str) -> bool {
        let stored = store.get_by_id(USERS_COLLECTION, id).await.unwrap().unwrap();
        normalize_user(&stored).record.is_online
    }

    #[tokio::test]
    async fn test_create_session_persists_under_token() {
        let store = Arc::new(MemoryDocumentStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let mgr = manager(store.clone(), clock);

        let user = sample_user("u1", "Aiko");
        let session = mgr.create_session(&user).await.unwrap();

        assert_eq!(session.id, session.token);
        assert!(session.is_valid);
        assert_eq!(session.expired_at, t0() + Duration::days(30));
        assert!(
            store
                .get_by_id(SESSIONS_COLLECTION, &session.token)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_tokens_are_never_reused() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));
        let user = sample_user("u1", "Aiko");
        let a = mgr.create_session(&user).await.unwrap();
        let b = mgr.create_session(&user).await.unwrap();
        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn test_validate_returns_snapshot() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));
        let user = sample_user("u1", "Aiko");
        let session = mgr.create_session(&user).await.unwrap();

        let validated = mgr.validate_session(&session.token).await.unwrap();
        assert_eq!(validated.user, user);
    }

    #[tokio::test]
    async fn test_validate_after_update_returns_new_snapshot() {
        let store = Arc::new(MemoryDocumentStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let mgr = manager(store, clock.clone());
        let mut session = mgr.create_session(&sample_user("u1", "Aiko")).await.unwrap();

        clock.advance(Duration::hours(1));
        session.user.name = "Aiko T.".to_string();
        let updated = mgr.update_session(session.clone()).await.unwrap();
        assert_eq!(updated.token, session.token);
        assert_eq!(updated.updated_at, t0() + Duration::hours(1));
        // Horizon is unchanged by updates.
        assert_eq!(updated.expired_at, session.expired_at);

        let validated = mgr.validate_session(&session.token).await.unwrap();
        assert_eq!(validated.user.name, "Aiko T.");
    }

    #[tokio::test]
    async fn test_other_sessions_keep_stale_snapshot() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));
        let user = sample_user("u1", "Aiko");
        let mut first = mgr.create_session(&user).await.unwrap();
        let second = mgr.create_session(&user).await.unwrap();

        first.user.name = "Renamed".to_string();
        mgr.update_session(first).await.unwrap();

        let other = mgr.validate_session(&second.token).await.unwrap();
        assert_eq!(other.user.name, "Aiko");
    }

    #[tokio::test]
    async fn test_session_expired_after_31_days() {
        let store = Arc::new(MemoryDocumentStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let mgr = manager(store, clock.clone());
        let session = mgr.create_session(&sample_user("u1", "Aiko")).await.unwrap();

        clock.advance(Duration::days(31));
        let err = mgr.validate_session(&session.token).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Unauthenticated(UnauthenticatedReason::Expired)
        ));
    }

    #[tokio::test]
    async fn test_session_expires_exactly_at_horizon() {
        let store = Arc::new(MemoryDocumentStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let mgr = manager(store, clock.clone());
        let session = mgr.create_session(&sample_user("u1", "Aiko")).await.unwrap();

        clock.set(session.expired_at - Duration::seconds(1));
        assert!(mgr.validate_session(&session.token).await.is_ok());

        clock.set(session.expired_at);
        assert!(mgr.validate_session(&session.token).await.is_err());
    }

    #[tokio::test]
    async fn test_invalidated_session_rejected() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));
        let mut session = mgr.create_session(&sample_user("u1", "Aiko")).await.unwrap();

        session.is_valid = false;
        mgr.update_session(session.clone()).await.unwrap();

        let err = mgr.validate_session(&session.token).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Unauthenticated(UnauthenticatedReason::Invalidated)
        ));
    }

    #[tokio::test]
    async fn test_unknown_and_empty_tokens_are_unauthenticated() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));
        for token in ["", "no-such-token"] {
            let err = mgr.validate_session(token).await.unwrap_err();
            assert!(matches!(
                err,
                SessionError::Unauthenticated(UnauthenticatedReason::Missing)
            ));
        }
    }

    #[tokio::test]
    async fn test_corrupt_session_document_is_unauthenticated() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .set_document(SESSIONS_COLLECTION, Some("bad"), &doc(json!({"token": 7})))
            .await
            .unwrap();
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));
        let err = mgr.validate_session("bad").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Unauthenticated(UnauthenticatedReason::Corrupt)
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_unauthenticated() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.fail_collection(SESSIONS_COLLECTION);
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));
        let err = mgr.validate_session("tok").await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
    }

    #[tokio::test]
    async fn test_delete_session_is_idempotent() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));
        let session = mgr.create_session(&sample_user("u1", "Aiko")).await.unwrap();

        mgr.delete_session(&session.token).await.unwrap();
        mgr.delete_session(&session.token).await.unwrap();
        assert!(mgr.validate_session(&session.token).await.is_err());
    }

    #[tokio::test]
    async fn test_mark_online_updates_user() {
        let store = Arc::new(MemoryDocumentStore::new());
        seed_user(&store, "u1").await;
        let mgr = manager(store.clone(), Arc::new(ManualClock::new(t0())));

        mgr.mark_online("u1").await.unwrap();
        assert!(is_online(&store, "u1").await);
    }

    #[tokio::test]
    async fn test_validate_marks_user_online_in_background() {
        let store = Arc::new(MemoryDocumentStore::new());
        let user = seed_user(&store, "u1").await;
        let mgr = manager(store.clone(), Arc::new(ManualClock::new(t0())));
        let session = mgr.create_session(&user).await.unwrap();

        mgr.validate_session(&session.token).await.unwrap();
        for _ in 0..10 {
            if is_online(&store, "u1").await {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("user was not marked online");
    }

    #[tokio::test]
    async fn test_resolve_session_leaves_online_flag_alone() {
        let store = Arc::new(MemoryDocumentStore::new());
        let user = seed_user(&store, "u1").await;
        let mgr = manager(store.clone(), Arc::new(ManualClock::new(t0())));
        let session = mgr.create_session(&user).await.unwrap();

        let resolved = mgr.resolve_session(&session.token).await.unwrap();
        assert_eq!(resolved.user, user);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!is_online(&store, "u1").await);
    }

    #[tokio::test]
    async fn test_legacy_pascal_case_session_validates() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .set_document(
                SESSIONS_COLLECTION,
                Some("legacy"),
                &doc(json!({
                    "ID": "legacy",
                    "Token": "legacy",
                    "User": {
                        "ID": "u1",
                        "Name": "Aiko",
                        "Email": "a@b.c",
                        "Password": "$argon2id$v=19$old",
                        "Icon": "",
                        "IsOnline": true,
                        "CreatedAt": "2024-12-01T00:00:00Z",
                        "UpdatedAt": "2024-12-02T00:00:00Z"
                    },
                    "CreatedAt": "2024-12-20T00:00:00Z",
                    "UpdatedAt": "2024-12-20T00:00:00Z",
                    "ExpiredAt": "2025-01-19T00:00:00Z",
                    "IsValid": true
                })),
            )
            .await
            .unwrap();
        let mgr = manager(store, Arc::new(ManualClock::new(t0())));

        let session = mgr.resolve_session("legacy").await.unwrap();
        assert_eq!(session.user.id, "u1");
        assert_eq!(session.user.name, "Aiko");
        assert_eq!(session.user.email, "a@b.c");
        assert!(session.user.is_online);
        assert!(session.user.created_at.is_some());
    }

    #[tokio::test]
    async fn test_online_update_failure_does_not_fail_validation() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mgr = manager(store.clone(), Arc::new(ManualClock::new(t0())));
        let session = mgr.create_session(&sample_user("ghost", "Ghost")).await.unwrap();

        store.fail_collection(USERS_COLLECTION);
        assert!(mgr.validate_session(&session.token).await.is_ok());
        // Background task logs and finishes without panicking.
        mgr.mark_online("ghost").await.unwrap();
    }
}
