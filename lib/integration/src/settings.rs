//! Per-call model settings exposed by an AI DIAL integration.

use crate::field_errors::{FieldErrorMap, ROOT_FIELD};
use crate::record::{DEFAULT_API_BASE, DEFAULT_API_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Settings used when calling a model through the integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSettings {
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

fn default_model_name() -> String {
    "gpt-35-turbo".to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_top_p() -> f64 {
    0.8
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            api_version: default_api_version(),
            api_base: default_api_base(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
        }
    }
}

impl PredictionSettings {
    /// Parses and validates settings from JSON, filling defaults.
    ///
    /// # Errors
    ///
    /// Returns field errors if the value is malformed or out of range.
    pub fn parse(value: JsonValue) -> Result<Self, FieldErrorMap> {
        let settings: Self = serde_json::from_value(value)
            .map_err(|e| FieldErrorMap::single(ROOT_FIELD, e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns one entry per offending field.
    pub fn validate(&self) -> Result<(), FieldErrorMap> {
        let mut errors = FieldErrorMap::new();
        if self.model_name.trim().is_empty() {
            errors.insert("model_name", "model name is required");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            errors.insert("temperature", "must be between 0 and 2");
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            errors.insert("top_p", "must be between 0 and 1");
        }
        if self.max_tokens == 0 {
            errors.insert("max_tokens", "must be greater than 0");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
