//! Application error type mapping to HTTP status codes and envelope format.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use gumshoe_types::error::ChatError;

use super::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the chat gateway and session actors.
    Chat(ChatError),
    /// Malformed request body.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Validation(e.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Chat(ChatError::InvalidInput(_)) | AppError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            AppError::Chat(ChatError::StorageFailure(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE")
            }
            AppError::Chat(ChatError::BackendFailure(_)) => {
                (StatusCode::BAD_GATEWAY, "BACKEND_FAILURE")
            }
            AppError::Chat(ChatError::BackendTimeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, "BACKEND_TIMEOUT")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = match &self {
            AppError::Chat(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::warn!(code, %message, "request failed");
        }

        ApiResponse::error(code, &message, Uuid::now_v7().to_string(), 0)
            .into_response_with(status)
    }
}
