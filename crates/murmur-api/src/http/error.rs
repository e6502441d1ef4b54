//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use murmur_types::error::{ChatError, SessionError, StoreError, UserError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Session(SessionError),
    User(UserError),
    Chat(ChatError),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Session(inner) => AppError::Session(inner),
            other => AppError::User(other),
        }
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

fn storage(e: &StoreError) -> (StatusCode, &'static str, String) {
    match e {
        StoreError::Timeout(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "STORE_UNAVAILABLE",
            "The document store did not respond in time".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORE_ERROR",
            "The document store failed".to_string(),
        ),
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Session(SessionError::Unauthenticated(reason)) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                format!("Login required: {reason}"),
            ),
            AppError::Session(SessionError::Storage(e)) => storage(e),
            AppError::Session(e @ SessionError::Token(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_ERROR", e.to_string())
            }
            AppError::User(UserError::NotFound) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found".to_string())
            }
            AppError::User(e @ UserError::EmailTaken(_)) => {
                (StatusCode::CONFLICT, "EMAIL_TAKEN", e.to_string())
            }
            AppError::User(e @ UserError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", e.to_string())
            }
            AppError::User(UserError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::User(UserError::Storage(e)) => storage(e),
            AppError::User(e) => (StatusCode::INTERNAL_SERVER_ERROR, "USER_ERROR", e.to_string()),
            AppError::Chat(e @ ChatError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string())
            }
            AppError::Chat(e @ ChatError::NotParticipant) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
            }
            AppError::Chat(ChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::Storage(e)) => storage(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = ?self, "request failed");
        }

        let request_id = uuid::Uuid::now_v7().to_string();
        let mut body = ApiResponse::error(code, &message, request_id, 0);
        if status == StatusCode::UNAUTHORIZED {
            body = body.with_link("login", "/api/v1/login");
        }

        (status, Json(body)).into_response()
    }
}
