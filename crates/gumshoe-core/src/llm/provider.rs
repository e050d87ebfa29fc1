//! LlmProvider trait definition.
//!
//! The generative backend is opaque to the rest of the system: an ordered
//! list of messages goes in, reply text comes out, and the call may fail or
//! be slow.

use gumshoe_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for generative backends (OpenAI-compatible endpoints, echo, ...).
///
/// Implementations live in gumshoe-infra (e.g., `OpenAiCompatibleProvider`).
/// Timeouts are applied by the caller, not the provider.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai_compatible", "echo").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
