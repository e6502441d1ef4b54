//! Account handlers for the logged-in user, plus public profile lookup.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use murmur_types::user::{Contact, User};

use super::{SetCookie, set_cookie};
use crate::http::cookie::session_cookie;
use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentSession;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// GET /api/v1/me - The user snapshot carried by the session.
pub async fn me(
    CurrentSession(session): CurrentSession,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(session.user, request_id, elapsed)
        .with_link("self", "/api/v1/me")
        .with_link("chats", "/api/v1/chats")
        .with_link("contacts", "/api/v1/contacts");

    Ok(Json(resp))
}

/// PUT /api/v1/me/name - Rename and refresh this session's snapshot.
///
/// Other sessions of the same user keep the old name until re-created.
pub async fn rename(
    State(state): State<AppState>,
    CurrentSession(mut session): CurrentSession,
    Json(body): Json<RenameRequest>,
) -> Result<(SetCookie, Json<ApiResponse<User>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    session.user = state.users.rename(&session.user.id, &body.name).await?;
    let session = state.sessions.update_session(session).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp =
        ApiResponse::success(session.user, request_id, elapsed).with_link("self", "/api/v1/me");

    Ok((set_cookie(session_cookie(&state.config, &session.token)), Json(resp)))
}

/// PUT /api/v1/me/password - Change the password after re-checking the current one.
pub async fn change_password(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    state
        .users
        .change_password(
            &session.user.id,
            &body.current_password,
            &body.new_password,
            &body.confirm_password,
        )
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(serde_json::json!({ "changed": true }), request_id, elapsed)
        .with_link("self", "/api/v1/me");

    Ok(Json(resp))
}

/// GET /api/v1/users/{id} - Public profile of another user.
pub async fn get_user(
    State(state): State<AppState>,
    _session: CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Contact>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state.users.get_user(&id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(user.to_contact(), request_id, elapsed)
        .with_link("self", &format!("/api/v1/users/{id}"));

    Ok(Json(resp))
}
