//! Core domain logic for Gumshoe.
//!
//! Session actors and their registry, context assembly, the scenario catalog,
//! the generative backend trait, and the chat gateway that ties them
//! together. Storage and provider implementations live in gumshoe-infra.

pub mod context;
pub mod gateway;
pub mod llm;
pub mod scenario;
pub mod session;
