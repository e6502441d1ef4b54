//! Contact discovery handler.

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};

use murmur_types::user::Contact;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentSession;
use crate::http::extractors::query::ContactQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/contacts - Users the caller has no chat with yet.
pub async fn list_contacts(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ContactQuery>,
) -> Result<Json<ApiResponse<Vec<Contact>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let contacts = state
        .contacts
        .candidates(&session.user.id, query.q.as_deref())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(contacts, request_id, elapsed)
        .with_link("self", "/api/v1/contacts")
        .with_link("start_chat", "/api/v1/chats");

    Ok(Json(resp))
}
