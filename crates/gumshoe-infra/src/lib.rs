//! Infrastructure layer for Gumshoe.
//!
//! Implementations of the traits defined in `gumshoe-core`: the SQLite
//! conversation store and the generative backend providers, plus
//! configuration loading.

pub mod config;
pub mod llm;
pub mod sqlite;
