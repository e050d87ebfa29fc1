//! Chat turn handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;

use gumshoe_core::gateway::ChatReply;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Request body for `POST /api/chat`.
///
/// The camelCase aliases keep the original browser client working.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(alias = "conversationId")]
    pub conversation_key: String,
    #[serde(alias = "message")]
    pub text: String,
    #[serde(default, alias = "mystery")]
    pub scenario: Option<String>,
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<ApiResponse<ChatReply>, AppError> {
    let timer = RequestTimer::start();
    let Json(req) = body?;

    let reply = state
        .gateway
        .chat(&req.conversation_key, &req.text, req.scenario.as_deref())
        .await?;

    Ok(timer.success(reply))
}
