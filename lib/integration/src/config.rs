//! Widget configuration supplied by the host page.

use crate::record::Mode;
use dial_settings_core::ProjectId;
use serde::Deserialize;

/// Where the widget talks to and how it labels its events.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetConfig {
    /// Base of the integrations API, e.g. `https://host/api/v1/integrations`.
    #[serde(default = "default_integrations_url")]
    pub integrations_url: String,

    /// Plugin name used in create and check-settings paths.
    #[serde(default = "default_plugin_name")]
    pub plugin_name: String,

    /// Section tag attached to "changed" events.
    #[serde(default = "default_section")]
    pub section: String,

    /// Active project.
    pub project_id: ProjectId,

    /// Environment tag copied into every new record.
    #[serde(default)]
    pub mode: Mode,
}

fn default_integrations_url() -> String {
    "http://localhost:8080/api/v1/integrations".to_string()
}

fn default_plugin_name() -> String {
    "ai_dial".to_string()
}

fn default_section() -> String {
    "ai".to_string()
}

impl WidgetConfig {
    /// Creates a configuration with defaults for everything but the project.
    #[must_use]
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            integrations_url: default_integrations_url(),
            plugin_name: default_plugin_name(),
            section: default_section(),
            project_id,
            mode: Mode::default(),
        }
    }

    #[must_use]
    pub fn with_integrations_url(mut self, url: impl Into<String>) -> Self {
        self.integrations_url = url.into();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}
