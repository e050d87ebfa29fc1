//! Request handlers for all API endpoints.

pub mod chat;
pub mod conversation;
pub mod scenario;
