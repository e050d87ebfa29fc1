use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the chat gateway and session actors.
///
/// Every variant is scoped to a single conversation; none is fatal to the
/// process.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// Rejected before any state change (empty text, malformed key).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The session store could not complete an append, read, or reset.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// The generative backend returned an error or an unusable reply.
    #[error("backend failure: {0}")]
    BackendFailure(String),

    /// The generative backend did not answer within the latency budget.
    #[error("backend timed out after {0:?}")]
    BackendTimeout(Duration),
}

impl ChatError {
    /// Whether the failure came from the generative backend.
    ///
    /// In that case the user message is already in the log and the caller
    /// may resubmit.
    pub fn is_backend(&self) -> bool {
        matches!(self, ChatError::BackendFailure(_) | ChatError::BackendTimeout(_))
    }
}

/// Errors from repository operations (used by trait definitions in gumshoe-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        ChatError::StorageFailure(e.to_string())
    }
}

impl From<crate::llm::LlmError> for ChatError {
    fn from(e: crate::llm::LlmError) -> Self {
        ChatError::BackendFailure(e.to_string())
    }
}
