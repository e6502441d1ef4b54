//! Session and conversation engine for Murmur.
//!
//! This crate defines the "ports" (document store, token generation,
//! password hashing, clock) that the infrastructure layer implements, and
//! the engine built on top of them: session lifecycle, tolerant document
//! normalization, conversation aggregation, and contact resolution. It
//! depends only on `murmur-types` -- never on `murmur-infra` or any
//! database/IO crate.

pub mod chat;
pub mod clock;
pub mod contact;
pub mod normalize;
pub mod session;
pub mod store;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;
