//! Offline provider that answers without a network call.
//!
//! Handy for running the service locally without credentials and for
//! exercising the full stack in tests.

use gumshoe_core::llm::LlmProvider;
use gumshoe_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, Usage,
};

/// Replies with a fixed noir line quoting the latest user message.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .ok_or_else(|| LlmError::InvalidRequest("no user message to answer".to_string()))?;

        let content = format!("\"{last_user}\", you say. Rain's still falling, pal. Keep talking.");
        let input_chars: usize = request.messages.iter().map(|m| m.content.len()).sum();

        Ok(CompletionResponse {
            id: format!("echo-{}", request.messages.len()),
            usage: Usage {
                input_tokens: (input_chars / 4) as u32,
                output_tokens: (content.len() / 4) as u32,
            },
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
        })
    }
}
