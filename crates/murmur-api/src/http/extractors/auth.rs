//! Session cookie authentication extractors.
//!
//! Both read the session token from the configured cookie and validate it.
//! `CurrentSession` also schedules the background online update;
//! `QuietSession` does not, for requests that end the session.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use murmur_types::error::{SessionError, UnauthenticatedReason};
use murmur_types::session::Session;

use crate::http::cookie::token_from_headers;
use crate::http::error::AppError;
use crate::state::AppState;

/// The validated session of the requesting user.
pub struct CurrentSession(pub Session);

/// The validated session, without marking the user online.
pub struct QuietSession(pub Session);

fn session_token(parts: &Parts, state: &AppState) -> Result<String, AppError> {
    token_from_headers(&parts.headers, &state.config.cookie_name).ok_or(AppError::Session(
        SessionError::Unauthenticated(UnauthenticatedReason::Missing),
    ))
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, state)?;
        let session = state.sessions.validate_session(&token).await?;
        Ok(CurrentSession(session))
    }
}

impl FromRequestParts<AppState> for QuietSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, state)?;
        let session = state.sessions.resolve_session(&token).await?;
        Ok(QuietSession(session))
    }
}
