//! The editable integration record.
//!
//! An [`IntegrationRecord`] is the full state of one AI DIAL integration as
//! the settings widget sees it. Connection parameters are only reachable
//! through setters so that changing the base URL always invalidates the
//! models discovered for the previous one.

use crate::catalog::{ModelDescriptor, TokenLimits};
use dial_settings_core::IntegrationId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Default API base for a new integration.
pub const DEFAULT_API_BASE: &str = "https://ai-proxy.lab.epam.com";

/// Default API version for a new integration.
pub const DEFAULT_API_VERSION: &str = "2023-03-15-preview";

/// Pass-through configuration object, never interpreted by the widget.
pub type OpaqueConfig = Map<String, JsonValue>;

/// A secret string such as an API token.
///
/// `Debug` and `Display` never print the value. The only way to read it is
/// [`Secret::expose`], which request payload builders use.
///
/// The backend may store the token either as a plain string or as a secret
/// field object (`{"from_secrets": false, "value": "..."}`). An object is kept
/// as received so it can be sent back unchanged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret {
    value: String,
    field: Option<Map<String, JsonValue>>,
}

impl Secret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            field: None,
        }
    }

    /// Returns the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Returns the secret field object this secret was read from, if any.
    #[must_use]
    pub fn stored_field(&self) -> Option<&Map<String, JsonValue>> {
        self.field.as_ref()
    }

    /// Returns true if no secret has been entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Field(Map<String, JsonValue>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Plain(value) => Ok(Self::new(value)),
            Raw::Field(field) => {
                let value = match field.get("value") {
                    Some(JsonValue::String(value)) => value.clone(),
                    Some(JsonValue::Null) | None => String::new(),
                    Some(_) => {
                        return Err(D::Error::custom("secret field value must be a string"));
                    }
                };
                Ok(Self {
                    value,
                    field: Some(field),
                })
            }
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Parameters that together decide which models are reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// API base URL.
    pub base_url: String,
    /// API version string.
    pub api_version: String,
}

impl ConnectionParams {
    /// Creates connection parameters.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: api_version.into(),
        }
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, DEFAULT_API_VERSION)
    }
}

/// Health indicator reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    /// Integration is healthy.
    #[default]
    Success,
    /// Health has not been determined yet.
    Pending,
    /// The last check failed.
    Failed,
}

/// Environment or tenant tag of the hosting page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(String);

impl Mode {
    /// Creates a mode tag.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        Self(mode.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::new("default")
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The editable state of one integration.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationRecord {
    identity: Option<IntegrationId>,
    credential: Secret,
    connection_params: ConnectionParams,
    discovered_models: Vec<String>,
    is_default: bool,
    opaque_config: OpaqueConfig,
    status: IntegrationStatus,
    mode: Mode,
}

impl IntegrationRecord {
    /// Creates a record with the defaults used when opening the widget for a
    /// new integration.
    #[must_use]
    pub fn fresh(mode: Mode) -> Self {
        Self {
            identity: None,
            credential: Secret::default(),
            connection_params: ConnectionParams::default(),
            discovered_models: Vec::new(),
            is_default: false,
            opaque_config: OpaqueConfig::new(),
            status: IntegrationStatus::default(),
            mode,
        }
    }

    /// Sets the backend identity.
    #[must_use]
    pub fn with_identity(mut self, identity: IntegrationId) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets the credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Secret) -> Self {
        self.credential = credential;
        self
    }

    /// Sets the connection parameters without touching discovered models.
    #[must_use]
    pub fn with_connection_params(mut self, params: ConnectionParams) -> Self {
        self.connection_params = params;
        self
    }

    /// Sets the discovered models.
    #[must_use]
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.discovered_models = models;
        self
    }

    /// Sets the default flag.
    #[must_use]
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Sets the opaque configuration.
    #[must_use]
    pub fn with_opaque_config(mut self, config: OpaqueConfig) -> Self {
        self.opaque_config = config;
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: IntegrationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn identity(&self) -> Option<&IntegrationId> {
        self.identity.as_ref()
    }

    pub fn credential(&self) -> &Secret {
        &self.credential
    }

    pub fn connection_params(&self) -> &ConnectionParams {
        &self.connection_params
    }

    pub fn discovered_models(&self) -> &[String] {
        &self.discovered_models
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn opaque_config(&self) -> &OpaqueConfig {
        &self.opaque_config
    }

    pub fn status(&self) -> IntegrationStatus {
        self.status
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Changes the base URL.
    ///
    /// Discovered models are cleared whenever the value actually changes.
    /// Returns true if models were cleared.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> bool {
        let base_url = base_url.into();
        if self.connection_params.base_url == base_url {
            return false;
        }
        self.connection_params.base_url = base_url;
        let had_models = !self.discovered_models.is_empty();
        self.discovered_models.clear();
        had_models
    }

    pub fn set_api_version(&mut self, api_version: impl Into<String>) {
        self.connection_params.api_version = api_version.into();
    }

    pub fn set_credential(&mut self, credential: Secret) {
        self.credential = credential;
    }

    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }

    pub fn set_opaque_config(&mut self, config: OpaqueConfig) {
        self.opaque_config = config;
    }

    pub(crate) fn set_identity(&mut self, identity: Option<IntegrationId>) {
        self.identity = identity;
    }

    pub(crate) fn set_discovered_models(&mut self, models: Vec<String>) {
        self.discovered_models = models;
    }

    /// Describes the discovered models, resolving token limits.
    #[must_use]
    pub fn describe_models(&self, limits: &TokenLimits) -> Vec<ModelDescriptor> {
        self.discovered_models
            .iter()
            .map(|name| ModelDescriptor::from_name(name, limits))
            .collect()
    }
}

/// One model entry as stored by the backend.
///
/// Older records store plain names, newer ones store full descriptors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    /// A bare model name.
    Name(String),
    /// A model descriptor.
    Descriptor(ModelDescriptor),
}

impl ModelEntry {
    /// Returns the model name.
    #[must_use]
    pub fn into_name(self) -> String {
        match self {
            Self::Name(name) => name,
            Self::Descriptor(descriptor) => descriptor.id,
        }
    }
}

/// Saved connection settings as the backend returns them.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedSettings {
    #[serde(default)]
    pub api_token: Secret,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// An integration as listed by the host page.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedIntegration {
    pub id: IntegrationId,
    #[serde(default)]
    pub config: OpaqueConfig,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub status: IntegrationStatus,
    pub settings: SavedSettings,
}

impl SavedIntegration {
    /// Converts the listing entry into an editable record.
    #[must_use]
    pub fn into_record(self, mode: Mode) -> IntegrationRecord {
        let settings = self.settings;
        IntegrationRecord {
            identity: Some(self.id),
            credential: settings.api_token,
            connection_params: ConnectionParams::new(settings.api_base, settings.api_version),
            discovered_models: settings
                .models
                .into_iter()
                .map(ModelEntry::into_name)
                .collect(),
            is_default: self.is_default,
            opaque_config: self.config,
            status: self.status,
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_has_defaults() {
        let record = IntegrationRecord::fresh(Mode::default());
        assert!(record.identity().is_none());
        assert!(record.credential().is_empty());
        assert_eq!(record.connection_params().base_url, DEFAULT_API_BASE);
        assert_eq!(record.connection_params().api_version, DEFAULT_API_VERSION);
        assert!(record.discovered_models().is_empty());
        assert!(!record.is_default());
        assert!(record.opaque_config().is_empty());
        assert_eq!(record.status(), IntegrationStatus::Success);
    }

    #[test]
    fn changing_base_url_clears_models() {
        let mut record = IntegrationRecord::fresh(Mode::default())
            .with_models(vec!["gpt-4".to_string(), "gpt-35-turbo".to_string()]);

        assert!(record.set_base_url("https://other.example.com"));
        assert!(record.discovered_models().is_empty());
    }

    #[test]
    fn same_base_url_keeps_models() {
        let mut record =
            IntegrationRecord::fresh(Mode::default()).with_models(vec!["gpt-4".to_string()]);

        assert!(!record.set_base_url(DEFAULT_API_BASE));
        assert_eq!(record.discovered_models(), ["gpt-4"]);
    }

    #[test]
    fn api_version_change_keeps_models() {
        let mut record =
            IntegrationRecord::fresh(Mode::default()).with_models(vec!["gpt-4".to_string()]);
        record.set_api_version("2024-02-01");
        assert_eq!(record.discovered_models(), ["gpt-4"]);
    }

    #[test]
    fn secret_is_redacted() {
        let secret = Secret::new("sk-very-secret");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert_eq!(secret.to_string(), "***");
        assert_eq!(secret.expose(), "sk-very-secret");

        let record = IntegrationRecord::fresh(Mode::default()).with_credential(secret);
        assert!(!format!("{record:?}").contains("sk-very-secret"));
    }

    #[test]
    fn saved_integration_accepts_names_and_descriptors() {
        let saved: SavedIntegration = serde_json::from_value(serde_json::json!({
            "id": 42,
            "config": {"name": "team proxy", "is_shared": false},
            "is_default": true,
            "settings": {
                "api_token": "tok",
                "api_base": "https://dial.example.com",
                "api_version": "2024-02-01",
                "models": [
                    "gpt-4",
                    {"id": "gpt-35-turbo", "name": "gpt-35-turbo", "token_limit": 4096}
                ]
            }
        }))
        .expect("deserialize");

        let record = saved.into_record(Mode::new("administration"));
        assert_eq!(record.identity().map(IntegrationId::as_str), Some("42"));
        assert_eq!(record.credential().expose(), "tok");
        assert_eq!(record.connection_params().base_url, "https://dial.example.com");
        assert_eq!(record.discovered_models(), ["gpt-4", "gpt-35-turbo"]);
        assert!(record.is_default());
        assert_eq!(
            record.opaque_config().get("name"),
            Some(&serde_json::json!("team proxy"))
        );
        assert_eq!(record.mode().as_str(), "administration");
    }

    #[test]
    fn saved_integration_accepts_secret_field_token() {
        let saved: SavedIntegration = serde_json::from_value(serde_json::json!({
            "id": 3,
            "settings": {
                "api_token": {"from_secrets": false, "value": "tok"},
                "api_base": "https://dial.example.com"
            }
        }))
        .expect("deserialize");

        let record = saved.into_record(Mode::default());
        assert_eq!(record.credential().expose(), "tok");
        assert_eq!(
            record.credential().stored_field().and_then(|f| f.get("from_secrets")),
            Some(&serde_json::json!(false))
        );
        assert!(!format!("{record:?}").contains("tok"));
    }

    #[test]
    fn secret_field_value_must_be_text() {
        let result = serde_json::from_value::<Secret>(serde_json::json!({"value": 12}));
        assert!(result.is_err());

        let empty: Secret = serde_json::from_value(serde_json::json!({"from_secrets": true}))
            .expect("deserialize");
        assert!(empty.is_empty());
    }

    #[test]
    fn saved_settings_fill_connection_defaults() {
        let saved: SavedIntegration = serde_json::from_value(serde_json::json!({
            "id": "7",
            "settings": {"api_token": "tok"}
        }))
        .expect("deserialize");

        let record = saved.into_record(Mode::default());
        assert_eq!(record.connection_params(), &ConnectionParams::default());
        assert_eq!(record.status(), IntegrationStatus::Success);
    }

    #[test]
    fn describe_models_resolves_limits() {
        let record = IntegrationRecord::fresh(Mode::default())
            .with_models(vec!["gpt-4".to_string(), "custom-model".to_string()]);
        let described = record.describe_models(&TokenLimits::default());
        assert_eq!(described[0].token_limit, Some(8192));
        assert_eq!(described[1].token_limit, Some(crate::catalog::DEFAULT_TOKEN_LIMIT));
    }
}
