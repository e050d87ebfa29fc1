//! Application state wiring all services together.
//!
//! `AppState` is the central dependency container for both the CLI and
//! HTTP API. It opens the conversation database, builds the backend provider
//! and scenario catalog, and assembles the chat gateway on top of the
//! session registry.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use gumshoe_core::gateway::{ChatGateway, GatewaySettings};
use gumshoe_core::llm::BoxLlmProvider;
use gumshoe_core::scenario::PresetCatalog;
use gumshoe_core::session::{RegistrySettings, SessionRegistry};
use gumshoe_infra::config::{load_global_config, resolve_api_key, resolve_data_dir};
use gumshoe_infra::llm::create_provider;
use gumshoe_infra::llm::echo::EchoProvider;
use gumshoe_infra::sqlite::{DatabasePool, SqliteSessionStore};
use gumshoe_infra::sqlite::pool::database_url;
use gumshoe_types::config::GlobalConfig;
use gumshoe_types::llm::LlmError;

/// Concrete gateway type for the SQLite-backed store.
pub type ConcreteGateway = ChatGateway<SqliteSessionStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ConcreteGateway>,
    pub config: Arc<GlobalConfig>,
    /// Root data directory (`~/.gumshoe/` unless overridden).
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Resolve the data directory, load `config.toml`, and build the state.
    ///
    /// With `require_backend` unset, a missing API key falls back to the echo
    /// provider so commands that never reach the backend still work.
    pub async fn init(require_backend: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;
        Self::build(data_dir, config, require_backend).await
    }

    /// Build the state from an explicit directory and configuration.
    pub async fn build(
        data_dir: PathBuf,
        config: GlobalConfig,
        require_backend: bool,
    ) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open conversation database")?;

        let provider = match create_provider(&config.backend, resolve_api_key(&config.backend)) {
            Ok(provider) => provider,
            Err(err) if !require_backend => {
                tracing::debug!("backend unavailable ({err}), using echo provider");
                BoxLlmProvider::new(EchoProvider::new())
            }
            Err(LlmError::AuthenticationFailed) => bail!(
                "no API key found in ${}; export it or set `provider = \"echo\"` under [backend] in {}",
                config.backend.api_key_env,
                data_dir.join("config.toml").display()
            ),
            Err(err) => return Err(err.into()),
        };

        let catalog = PresetCatalog::with_overrides(
            &config.scenarios,
            config.default_scenario.as_deref(),
        );
        let store = Arc::new(SqliteSessionStore::new(db_pool.clone()));
        let sessions = SessionRegistry::new(store, RegistrySettings::from(&config.session));
        let gateway = ChatGateway::new(
            sessions,
            Arc::new(provider),
            Arc::new(catalog),
            GatewaySettings::from_config(&config.session, &config.backend),
        );

        tracing::info!(
            data_dir = %data_dir.display(),
            provider = gateway.provider_name(),
            "application state initialized"
        );

        Ok(Self {
            gateway: Arc::new(gateway),
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }

    /// Stop every session actor and close the database pools.
    pub async fn shutdown(&self) {
        self.gateway.sessions().shutdown();
        self.db_pool.close().await;
    }
}
