//! HTTP API layer for Murmur.
//!
//! Axum-based JSON API at `/api/v1/` with cookie sessions, envelope
//! response format, and CORS support.

pub mod cookie;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
