//! HTTP API layer for Gumshoe.
//!
//! Axum-based JSON API under `/api/` with an envelope response format and
//! open CORS.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
