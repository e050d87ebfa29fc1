//! Generative backend implementations.
//!
//! Concrete implementations of the [`LlmProvider`](gumshoe_core::llm::LlmProvider)
//! trait, plus [`create_provider`] which builds the configured one.

pub mod echo;
pub mod openai_compat;

use gumshoe_core::llm::BoxLlmProvider;
use gumshoe_types::config::BackendConfig;
use gumshoe_types::llm::{LlmError, ProviderType};
use secrecy::SecretString;

use self::echo::EchoProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] from the backend configuration.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] if the provider needs an API key
/// and none was resolved.
pub fn create_provider(
    backend: &BackendConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    match backend.provider {
        ProviderType::OpenAiCompatible => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            let config = OpenAiCompatConfig::from_backend(backend, key);
            Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(config)))
        }
        ProviderType::Echo => Ok(BoxLlmProvider::new(EchoProvider::new())),
    }
}
