//! User accounts: registration, credentials, profile changes.

pub mod password;
pub mod service;

use murmur_types::error::StoreError;
use murmur_types::user::{USERS_COLLECTION, User};
use tracing::warn;

use crate::normalize::normalize_user;
use crate::store::DocumentStore;

pub use password::PasswordHasher;
pub use service::UserService;

/// Fetch and normalize a user document. `Ok(None)` when it does not exist.
pub(crate) async fn load_user<S: DocumentStore>(
    store: &S,
    user_id: &str,
) -> Result<Option<User>, StoreError> {
    let Some(doc) = store.get_by_id(USERS_COLLECTION, user_id).await? else {
        return Ok(None);
    };
    let normalized = normalize_user(&doc);
    if let Some(diag) = normalized.malformed("user", &doc.id) {
        warn!(%diag, "user document presumably malformed");
    }
    Ok(Some(normalized.into_record()))
}
