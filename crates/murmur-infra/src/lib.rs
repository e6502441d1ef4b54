//! Infrastructure layer for Murmur.
//!
//! Contains implementations of the ports defined in `murmur-core`: the
//! SQLite-backed document store, Argon2id password hashing, OS-RNG session
//! tokens, the configuration loader, and the runtime backend switch.

pub mod config;
pub mod crypto;
pub mod sqlite;
pub mod store;
