//! Shared domain types for Murmur.
//!
//! This crate contains the core domain types used across the Murmur
//! messaging engine: users, sessions, chats, messages, raw store documents,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod document;
pub mod error;
pub mod session;
pub mod user;
