//! Signup, login, and logout handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use murmur_types::user::User;

use super::{SetCookie, set_cookie};
use crate::http::cookie::{clear_session_cookie, session_cookie};
use crate::http::error::AppError;
use crate::http::extractors::auth::QuietSession;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// POST /api/v1/signup - Register and log in.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, SetCookie, Json<ApiResponse<User>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state
        .users
        .register(&body.name, &body.email, &body.password)
        .await?;
    let session = state.sessions.create_session(&user).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(session.user, request_id, elapsed)
        .with_link("self", "/api/v1/me")
        .with_link("chats", "/api/v1/chats");

    Ok((
        StatusCode::CREATED,
        set_cookie(session_cookie(&state.config, &session.token)),
        Json(resp),
    ))
}

/// POST /api/v1/login - Exchange credentials for a session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(SetCookie, Json<ApiResponse<User>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let session = state
        .users
        .login(state.sessions.as_ref(), &body.email, &body.password)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(session.user, request_id, elapsed)
        .with_link("self", "/api/v1/me")
        .with_link("chats", "/api/v1/chats");

    Ok((set_cookie(session_cookie(&state.config, &session.token)), Json(resp)))
}

/// POST /api/v1/logout - Drop the session and clear the cookie.
///
/// Uses `QuietSession` so the user is left offline.
pub async fn logout(
    State(state): State<AppState>,
    QuietSession(session): QuietSession,
) -> Result<(SetCookie, Json<ApiResponse<serde_json::Value>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    state.users.logout(state.sessions.as_ref(), &session).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(serde_json::json!({ "logged_out": true }), request_id, elapsed)
        .with_link("login", "/api/v1/login");

    Ok((set_cookie(clear_session_cookie(&state.config)), Json(resp)))
}

/// POST /api/v1/reset-password - Set a new password by email, no session needed.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    state
        .users
        .reset_password(&body.email, &body.password, &body.password_confirm)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(serde_json::json!({ "reset": true }), request_id, elapsed)
        .with_link("login", "/api/v1/login");

    Ok(Json(resp))
}
