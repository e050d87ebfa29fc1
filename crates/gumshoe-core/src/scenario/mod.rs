//! Scenario catalog: maps scenario ids to instruction prefixes.

pub mod presets;

use gumshoe_types::scenario::{Scenario, ScenarioSummary};

pub use presets::PresetCatalog;

/// Source of scenario instructions for context assembly.
pub trait ScenarioCatalog: Send + Sync {
    fn get(&self, id: &str) -> Option<&Scenario>;

    /// Scenario used when a conversation has no binding or an unknown one.
    fn default_scenario(&self) -> &Scenario;

    fn list(&self) -> Vec<ScenarioSummary>;

    /// Instruction text for `id`, falling back to the default scenario.
    fn instruction(&self, id: Option<&str>) -> &str {
        id.and_then(|id| self.get(id))
            .unwrap_or_else(|| self.default_scenario())
            .instruction
            .as_str()
    }
}
