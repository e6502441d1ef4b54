//! User account service.
//!
//! Registration, credential checks, and profile changes over the `users`
//! collection. New documents are written with snake_case keys; reads go
//! through the normalizer so legacy PascalCase documents keep working.

use std::sync::Arc;

use murmur_types::config::AppConfig;
use murmur_types::error::UserError;
use murmur_types::session::Session;
use murmur_types::user::{USERS_COLLECTION, User};
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use super::load_user;
use super::password::PasswordHasher;
use crate::clock::Clock;
use crate::normalize::{format_timestamp, keys, normalize_user};
use crate::session::{SessionManager, TokenGenerator};
use crate::store::{DocumentStore, into_document};

/// Service for user accounts.
///
/// Generic over the document store and password hasher.
pub struct UserService<S: DocumentStore, H: PasswordHasher> {
    store: Arc<S>,
    hasher: H,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
}

impl<S: DocumentStore + 'static, H: PasswordHasher> UserService<S, H> {
    pub fn new(store: Arc<S>, hasher: H, clock: Arc<dyn Clock>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            hasher,
            clock,
            config,
        }
    }

    /// Create an account.
    ///
    /// Fails with `Validation` on bad input and `EmailTaken` when another
    /// user already registered the address.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserError> {
        let name = self.validate_name(name)?;
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(UserError::Validation("email address is invalid".to_string()));
        }
        self.validate_password(password)?;

        if self.find_by_email(email).await?.is_some() {
            return Err(UserError::EmailTaken(email.to_string()));
        }

        let password_hash = self.hasher.hash(password)?;
        let now = self.clock.now();
        let id = Uuid::now_v7().to_string();

        let data = into_document(json!({
            "name": name,
            "email": email,
            "password": password_hash,
            "icon": "",
            "is_online": false,
            "created_at": format_timestamp(&now),
            "updated_at": format_timestamp(&now),
        }));
        self.store
            .set_document(USERS_COLLECTION, Some(&id), &data)
            .await?;

        info!(user_id = %id, "user registered");
        Ok(User {
            id,
            name,
            email: email.to_string(),
            password_hash,
            icon: String::new(),
            is_online: false,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    /// Check credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError> {
        let user = self
            .find_by_email(email.trim())
            .await?
            .ok_or(UserError::InvalidCredentials)?;
        if !self.hasher.verify(password, &user.password_hash) {
            return Err(UserError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, UserError> {
        load_user(self.store.as_ref(), user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Change the display name.
    ///
    /// Only the user document changes. Sessions keep their snapshot until
    /// the caller refreshes one with `SessionManager::update_session`.
    pub async fn rename(&self, user_id: &str, new_name: &str) -> Result<User, UserError> {
        let name = self.validate_name(new_name)?;
        let mut user = self.get_user(user_id).await?;
        let now = self.clock.now();

        self.store
            .update_field(USERS_COLLECTION, user_id, keys::NAME[0], &json!(name))
            .await?;
        self.store
            .update_field(
                USERS_COLLECTION,
                user_id,
                keys::UPDATED_AT[0],
                &json!(format_timestamp(&now)),
            )
            .await?;

        user.name = name;
        user.updated_at = Some(now);
        Ok(user)
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), UserError> {
        let user = self.get_user(user_id).await?;
        if !self.hasher.verify(current, &user.password_hash) {
            return Err(UserError::InvalidCredentials);
        }
        if new_password != confirm {
            return Err(UserError::Validation("passwords do not match".to_string()));
        }
        self.validate_password(new_password)?;

        let hash = self.hasher.hash(new_password)?;
        let now = self.clock.now();
        self.store
            .update_field(USERS_COLLECTION, user_id, keys::PASSWORD[0], &json!(hash))
            .await?;
        self.store
            .update_field(
                USERS_COLLECTION,
                user_id,
                keys::UPDATED_AT[0],
                &json!(format_timestamp(&now)),
            )
            .await?;
        info!(user_id = %user_id, "password changed");
        Ok(())
    }

    /// Set a new password for the account registered under `email`.
    ///
    /// No current password is asked for. Input is checked before the
    /// lookup; an unknown address fails with `NotFound`.
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), UserError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(UserError::Validation("email address is required".to_string()));
        }
        self.validate_password(new_password)?;
        if new_password != confirm {
            return Err(UserError::Validation("passwords do not match".to_string()));
        }

        let user = self.find_by_email(email).await?.ok_or(UserError::NotFound)?;
        let hash = self.hasher.hash(new_password)?;
        let now = self.clock.now();
        self.store
            .update_field(USERS_COLLECTION, &user.id, keys::PASSWORD[0], &json!(hash))
            .await?;
        self.store
            .update_field(
                USERS_COLLECTION,
                &user.id,
                keys::UPDATED_AT[0],
                &json!(format_timestamp(&now)),
            )
            .await?;
        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    /// Best-effort `is_online = false`. Failures are logged only.
    pub async fn set_offline(&self, user_id: &str) {
        if let Err(e) = self
            .store
            .update_field(USERS_COLLECTION, user_id, keys::IS_ONLINE[0], &Value::Bool(false))
            .await
        {
            warn!(user_id = %user_id, error = %e, "failed to mark user offline");
        }
    }

    /// Authenticate and issue a session.
    pub async fn login<T: TokenGenerator>(
        &self,
        sessions: &SessionManager<S, T>,
        email: &str,
        password: &str,
    ) -> Result<Session, UserError> {
        let user = self.authenticate(email, password).await?;
        Ok(sessions.create_session(&user).await?)
    }

    /// Mark the user offline, then drop the session.
    pub async fn logout<T: TokenGenerator>(
        &self,
        sessions: &SessionManager<S, T>,
        session: &Session,
    ) -> Result<(), UserError> {
        self.set_offline(&session.user.id).await;
        sessions.delete_session(&session.token).await?;
        info!(user_id = %session.user.id, "logged out");
        Ok(())
    }

    /// Look up by `email`, then by the legacy `Email` key.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let value = json!(email);
        for key in keys::EMAIL {
            let hits = self.store.query_equals(USERS_COLLECTION, key, &value).await?;
            if let Some(doc) = hits.first() {
                return Ok(Some(normalize_user(doc).into_record()));
            }
        }
        Ok(None)
    }

    fn validate_name(&self, name: &str) -> Result<String, UserError> {
        let name = name.trim();
        let len = name.chars().count();
        if len < self.config.name_min_len || len > self.config.name_max_len {
            return Err(UserError::Validation(format!(
                "name must be {}-{} characters",
                self.config.name_min_len, self.config.name_max_len
            )));
        }
        Ok(name.to_string())
    }

    fn validate_password(&self, password: &str) -> Result<(), UserError> {
        if password.chars().count() < self.config.min_password_len {
            return Err(UserError::Validation(format!(
                "password must be at least {} characters",
                self.config.min_password_len
            )));
        }
        Ok(())
    }
}
