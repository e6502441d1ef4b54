//! PasswordHasher trait.
//!
//! The Argon2id adapter lives in murmur-infra; plaintext passwords never
//! reach the store.

use murmur_types::error::UserError;

/// Salted one-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` with a fresh salt into a self-describing string.
    fn hash(&self, password: &str) -> Result<String, UserError>;

    /// Check `password` against a stored hash. Unparseable hashes never match.
    fn verify(&self, password: &str, hash: &str) -> bool;
}
