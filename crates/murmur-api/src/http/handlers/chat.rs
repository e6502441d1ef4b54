//! Conversation list and message handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use murmur_types::chat::{Chat, Message};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentSession;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartChatRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// GET /api/v1/chats - Conversation list, most recent activity first.
pub async fn list_chats(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ApiResponse<Vec<Chat>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chats = state.aggregator.conversation_list(&session.user.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(chats, request_id, elapsed)
        .with_link("self", "/api/v1/chats")
        .with_link("contacts", "/api/v1/contacts");

    Ok(Json(resp))
}

/// POST /api/v1/chats - Start (or reopen) a chat with another user.
pub async fn start_chat(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<StartChatRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chat_id = state.chats.start_chat(&session.user.id, &body.user_id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let messages = format!("/api/v1/chats/{chat_id}/messages");
    let resp = ApiResponse::success(json!({ "chat_id": chat_id }), request_id, elapsed)
        .with_link("messages", &messages);

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/chats/{id}/messages - Messages ascending by time.
pub async fn get_messages(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let messages = state.chats.get_messages(&id, &session.user.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link("self", &format!("/api/v1/chats/{id}/messages"))
        .with_link("read", &format!("/api/v1/chats/{id}/read"));

    Ok(Json(resp))
}

/// POST /api/v1/chats/{id}/messages - Send a message.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let message = state
        .chats
        .send_message(&id, &session.user, &body.content)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(message, request_id, elapsed)
        .with_link("messages", &format!("/api/v1/chats/{id}/messages"));

    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/v1/chats/{id}/read - Mark incoming messages read.
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let updated = state.chats.mark_read(&id, &session.user.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(json!({ "updated": updated }), request_id, elapsed)
        .with_link("messages", &format!("/api/v1/chats/{id}/messages"));

    Ok(Json(resp))
}
