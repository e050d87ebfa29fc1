//! Scenario descriptors.
//!
//! A scenario is a named preset that selects the instruction prefix sent to
//! the generative backend ahead of the conversation window.

use serde::{Deserialize, Serialize};

/// One entry of the scenario catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable identifier supplied by clients (e.g. `"heist"`).
    pub id: String,
    /// Short human-readable label.
    pub title: String,
    /// Instruction text prepended as the `system` message.
    pub instruction: String,
}

/// Listing entry returned to clients; the instruction text stays server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub title: String,
    pub is_default: bool,
}
