//! Shared domain types for Gumshoe.
//!
//! Conversation keys and log entries, LLM request/response shapes,
//! configuration, scenario descriptors, and the error taxonomy shared by
//! every layer.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod scenario;
