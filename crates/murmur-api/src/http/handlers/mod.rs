//! HTTP request handlers for the REST API.

pub mod auth;
pub mod chat;
pub mod contact;
pub mod user;

use axum::http::HeaderName;
use axum::http::header::SET_COOKIE;

/// Single `Set-Cookie` header, in the tuple form axum accepts as response parts.
pub(crate) type SetCookie = [(HeaderName, String); 1];

pub(crate) fn set_cookie(value: String) -> SetCookie {
    [(SET_COOKIE, value)]
}
