use crate::{
    config::{AppConfig, ConfigOverrides},
    events::EventBus,
    gateway::ApiGateway,
    session::{FileStorage, SessionStore},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc};

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_base_url: String,
    pub session_file: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_base_url: String, session_file: PathBuf) -> Self {
        Self {
            api_base_url,
            session_file,
        }
    }

    /// Environment config with the CLI base URL applied on top.
    ///
    /// # Errors
    /// Returns an error if the resulting base URL is not a valid http(s) URL.
    pub fn config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load();
        config.apply(ConfigOverrides {
            api_base_url: Some(self.api_base_url.clone()),
            timeout: None,
        });
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn session_store(&self) -> Arc<SessionStore> {
        let storage = Arc::new(FileStorage::new(&self.session_file));
        Arc::new(SessionStore::load(storage))
    }

    /// Gateway wired to the persisted session and the given event bus.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn gateway(&self, events: EventBus) -> Result<ApiGateway> {
        let config = self.config()?;
        ApiGateway::new(&config, self.session_store(), events).context("failed to build HTTP client")
    }
}

/// `$HOME/.config/registrar/session.json`, or a file in the working directory
/// when `HOME` is unset.
#[must_use]
pub fn default_session_file() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home)
            .join(".config")
            .join("registrar")
            .join("session.json"),
        _ => PathBuf::from("registrar-session.json"),
    }
}
