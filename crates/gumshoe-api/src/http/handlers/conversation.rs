//! Conversation log handlers: history, reset and narration.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use gumshoe_types::chat::ChatMessage;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Body naming a single conversation.
#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    #[serde(alias = "conversationId")]
    pub conversation_key: String,
}

#[derive(Debug, Deserialize)]
pub struct NarrateRequest {
    #[serde(alias = "conversationId")]
    pub conversation_key: String,
    #[serde(alias = "message")]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
}

/// POST /api/history
pub async fn history(
    State(state): State<AppState>,
    body: Result<Json<ConversationRequest>, JsonRejection>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    let timer = RequestTimer::start();
    let Json(req) = body?;

    let log = state.gateway.history(&req.conversation_key).await?;
    Ok(timer.success(log))
}

/// POST /api/reset
pub async fn reset(
    State(state): State<AppState>,
    body: Result<Json<ConversationRequest>, JsonRejection>,
) -> Result<ApiResponse<ResetResponse>, AppError> {
    let timer = RequestTimer::start();
    let Json(req) = body?;

    state.gateway.reset(&req.conversation_key).await?;
    tracing::info!(key = %req.conversation_key, "conversation reset");

    Ok(timer.success(ResetResponse { success: true }))
}

/// POST /api/narrate
pub async fn narrate(
    State(state): State<AppState>,
    body: Result<Json<NarrateRequest>, JsonRejection>,
) -> Result<ApiResponse<ChatMessage>, AppError> {
    let timer = RequestTimer::start();
    let Json(req) = body?;

    let entry = state.gateway.narrate(&req.conversation_key, &req.text).await?;
    Ok(timer.success(entry))
}
