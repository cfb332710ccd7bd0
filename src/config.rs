//! Client configuration for the account service endpoint. The base address is
//! read from `REGISTRAR_API_BASE_URL` and falls back to the local development
//! API when unset. Explicit overrides (CLI flags) are applied on top of the
//! environment. Configuration values are public; do not store secrets here.

use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable holding the API base address.
pub const ENV_API_BASE_URL: &str = "REGISTRAR_API_BASE_URL";
/// Base address used when nothing is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
/// Default request timeout applied by the gateway.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid API base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Values that replace the environment-derived configuration when present.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl AppConfig {
    /// Loads config from the environment, defaulting to the local endpoint.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        let overrides = ConfigOverrides {
            api_base_url: std::env::var(ENV_API_BASE_URL).ok(),
            timeout: None,
        };
        config.apply(overrides);
        config
    }

    /// Applies overrides, ignoring blank values.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(value) = overrides
            .api_base_url
            .as_deref()
            .and_then(normalize_value)
        {
            self.api_base_url = value;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
    }

    /// Checks that the base address is an absolute http(s) URL.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidBaseUrl` if the address cannot be parsed or
    /// uses another scheme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_base_url).map_err(|err| ConfigError::InvalidBaseUrl {
            url: self.api_base_url.clone(),
            reason: err.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigError::InvalidBaseUrl {
                url: self.api_base_url.clone(),
                reason: format!("unsupported scheme {scheme}"),
            }),
        }
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
