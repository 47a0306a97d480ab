//! Client configuration.
//!
//! Loaded via the `config` crate from an optional file and environment
//! variables prefixed with `DIAL_SETTINGS__`, e.g.
//! `DIAL_SETTINGS__WIDGET__PROJECT_ID=7`.

use crate::error::ClientError;
use dial_settings_integration::WidgetConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "DIAL_SETTINGS";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Widget wiring: backend URL, plugin, section, project and mode.
    pub widget: WidgetConfig,

    /// Timeout for integrations API requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for model discovery requests, in seconds.
    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,

    /// Optional JSON file with per-model token limit overrides.
    #[serde(default)]
    pub token_limits_file: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_discovery_timeout_secs() -> u64 {
    5
}

impl ClientConfig {
    #[must_use]
    pub fn new(widget: WidgetConfig) -> Self {
        Self {
            widget,
            request_timeout_secs: default_request_timeout_secs(),
            discovery_timeout_secs: default_discovery_timeout_secs(),
            token_limits_file: None,
        }
    }

    /// Loads configuration from `file` (if given) and the environment.
    ///
    /// Environment variables take precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or required configuration
    /// is missing or invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ClientError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ClientError> {
        if self.widget.integrations_url.trim().is_empty() {
            return Err(ClientError::Config {
                reason: "widget.integrations_url must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == 0 || self.discovery_timeout_secs == 0 {
            return Err(ClientError::Config {
                reason: "timeouts must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}
