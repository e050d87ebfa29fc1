//! Configuration for the OpenAI-compatible provider.

use gumshoe_types::config::BackendConfig;
use secrecy::SecretString;

/// Connection settings for an OpenAI-compatible chat completions endpoint.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name reported by `LlmProvider::name`.
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Fallback model when a request leaves it empty.
    pub model: String,
}

impl OpenAiCompatConfig {
    pub fn from_backend(backend: &BackendConfig, api_key: SecretString) -> Self {
        Self {
            provider_name: backend.provider.to_string(),
            base_url: backend.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: backend.model.clone(),
        }
    }
}

/// OpenAI default configuration.
///
/// Base URL: `https://api.openai.com/v1`
pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: "https://api.openai.com/v1".into(),
        api_key,
        model: model.into(),
    }
}
