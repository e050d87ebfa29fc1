//! Global configuration types for Gumshoe.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! HTTP server, session actors, the generative backend, and scenario
//! overrides. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderType;
use crate::scenario::Scenario;

/// Top-level configuration for the Gumshoe service.
///
/// Loaded from `~/.gumshoe/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    /// Scenario used when a conversation has no (known) binding.
    #[serde(default)]
    pub default_scenario: Option<String>,

    /// Additional scenarios, or replacements for built-ins with the same id.
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory of static assets served for unknown paths, if it exists.
    #[serde(default = "default_web_dir")]
    pub web_dir: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_web_dir() -> String {
    "public".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_dir: default_web_dir(),
        }
    }
}

/// Session actor and context window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of trailing log entries sent to the backend.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    /// Bounded mailbox size of each session actor.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    /// Retire actors idle for this long; `None` keeps them forever.
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    /// Longest accepted message text, in characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_context_window() -> usize {
    15
}

fn default_mailbox_capacity() -> usize {
    64
}

fn default_max_message_chars() -> usize {
    4_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            mailbox_capacity: default_mailbox_capacity(),
            idle_timeout_secs: None,
            max_message_chars: default_max_message_chars(),
        }
    }
}

/// Generative backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderType,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Replies are meant to be short; keep the output budget small.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Latency budget for a single backend call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> ProviderType {
    ProviderType::OpenAiCompatible
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.session.context_window, 15);
        assert_eq!(config.session.mailbox_capacity, 64);
        assert!(config.session.idle_timeout_secs.is_none());
        assert_eq!(config.backend.max_tokens, 150);
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(config.scenarios.is_empty());
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.backend.provider, ProviderType::OpenAiCompatible);
        assert_eq!(config.backend.api_key_env, "OPENAI_API_KEY");
        assert!(config.default_scenario.is_none());
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
default_scenario = "heist"

[server]
port = 9000

[session]
context_window = 10
idle_timeout_secs = 600

[backend]
provider = "echo"
model = "llama-3.3-70b"
timeout_secs = 5

[[scenarios]]
id = "harbor"
title = "Trouble at the Harbor"
instruction = "You are a dockside informant."
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_scenario.as_deref(), Some("heist"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.session.context_window, 10);
        assert_eq!(config.session.idle_timeout_secs, Some(600));
        assert_eq!(config.session.mailbox_capacity, 64);
        assert_eq!(config.backend.provider, ProviderType::Echo);
        assert_eq!(config.backend.model, "llama-3.3-70b");
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.scenarios[0].id, "harbor");
    }
}
