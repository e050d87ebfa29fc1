//! Configuration loading for Gumshoe.
//!
//! Reads `config.toml` from the data directory (`~/.gumshoe/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use gumshoe_types::config::{BackendConfig, GlobalConfig};
use secrecy::SecretString;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "GUMSHOE_DATA_DIR";

/// Resolve the data directory.
///
/// Uses `GUMSHOE_DATA_DIR` if set, otherwise `~/.gumshoe`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".gumshoe");
    }

    PathBuf::from(".gumshoe")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Read the backend API key from the environment variable named in config.
///
/// Returns `None` when the variable is unset or empty.
pub fn resolve_api_key(backend: &BackendConfig) -> Option<SecretString> {
    std::env::var(&backend.api_key_env)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
}
