//! Cryptographic operations for Murmur.
//!
//! - `password`: Argon2id password hashing
//! - `token`: 256-bit random session tokens

pub mod password;
pub mod token;
