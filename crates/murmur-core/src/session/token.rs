//! TokenGenerator trait for issuing session credentials.
//!
//! Defined in murmur-core so the session manager can mint tokens without
//! depending on a specific RNG. The OS-backed adapter lives in murmur-infra.

use murmur_types::error::SessionError;

/// Number of random bytes behind every session token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Source of opaque, URL-safe session tokens.
///
/// Every call must return a fresh value; tokens are never reused.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> Result<String, SessionError>;
}
