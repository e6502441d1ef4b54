use thiserror::Error;

/// Errors from the document store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("store call timed out after {0}s")]
    Timeout(u64),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("document encoding error: {0}")]
    Encoding(String),
}

/// Why a session could not authenticate a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    /// No credential was presented, or no session exists for it.
    Missing,
    /// The session outlived its fixed horizon.
    Expired,
    /// The session was explicitly killed.
    Invalidated,
    /// The stored session document could not be decoded.
    Corrupt,
}

impl std::fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnauthenticatedReason::Missing => write!(f, "no session"),
            UnauthenticatedReason::Expired => write!(f, "session expired"),
            UnauthenticatedReason::Invalidated => write!(f, "session invalidated"),
            UnauthenticatedReason::Corrupt => write!(f, "session unreadable"),
        }
    }
}

/// Errors related to session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(UnauthenticatedReason),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("token generation failed: {0}")]
    Token(String),
}

/// Errors related to chat and message operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("user is not a participant of this chat")]
    NotParticipant,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Errors related to user account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("password hashing failed")]
    Hashing,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A document whose fields all fell back to defaults during normalization.
///
/// Diagnostic only: it is logged, never returned as a failure.
#[derive(Debug, Error)]
#[error("malformed {kind} document '{id}': defaulted fields {fields:?}")]
pub struct MalformedDocument {
    pub kind: &'static str,
    pub id: String,
    pub fields: Vec<&'static str>,
}
