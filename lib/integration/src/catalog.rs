//! Model descriptors and token limits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Context size assumed for models without a known limit.
pub const DEFAULT_TOKEN_LIMIT: u32 = 8096;

/// What a model can be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub completion: bool,
    #[serde(default = "default_true")]
    pub chat_completion: bool,
    #[serde(default)]
    pub embeddings: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            completion: false,
            chat_completion: true,
            embeddings: false,
        }
    }
}

/// A model offered by the serving backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Deployment id, used as the model name in requests.
    pub id: String,
    /// Display name. Falls back to the id.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub token_limit: Option<u32>,
}

impl ModelDescriptor {
    /// Builds a descriptor for a bare model name.
    #[must_use]
    pub fn from_name(name: &str, limits: &TokenLimits) -> Self {
        Self {
            id: name.to_string(),
            name: Some(name.to_string()),
            capabilities: Capabilities::default(),
            token_limit: Some(limits.limit_for(name)),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Returns the token limit, consulting `limits` when none is stored.
    #[must_use]
    pub fn resolved_token_limit(&self, limits: &TokenLimits) -> u32 {
        self.token_limit.unwrap_or_else(|| limits.limit_for(&self.id))
    }
}

/// Per-model context sizes.
///
/// A `None` entry marks a model with no meaningful limit (embeddings,
/// image models); lookups for it resolve to [`DEFAULT_TOKEN_LIMIT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenLimits(HashMap<String, Option<u32>>);

impl TokenLimits {
    /// Parses a JSON object of `{model: limit}` entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a JSON object of integers or nulls.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }

    /// Overlays `overrides` on top of these limits.
    #[must_use]
    pub fn merged_with(mut self, overrides: TokenLimits) -> Self {
        self.0.extend(overrides.0);
        self
    }

    /// Returns the limit for a model.
    #[must_use]
    pub fn limit_for(&self, model: &str) -> u32 {
        self.0
            .get(model)
            .copied()
            .flatten()
            .unwrap_or(DEFAULT_TOKEN_LIMIT)
    }
}

impl Default for TokenLimits {
    fn default() -> Self {
        let entries = [
            ("text-embedding-ada-002", None),
            ("gpt-35-turbo", Some(4096)),
            ("gpt-35-turbo-16k", Some(16384)),
            ("gpt-4", Some(8192)),
            ("gpt-4-32k", Some(32768)),
            ("chat-bison@001", Some(8192)),
            ("ai21.j2-grande-instruct", Some(8191)),
            ("ai21.j2-jumbo-instruct", Some(8191)),
            ("anthropic.claude-instant-v1", Some(100_000)),
            ("anthropic.claude-v1", Some(100_000)),
            ("anthropic.claude-v2", Some(100_000)),
            ("stability.stable-diffusion-xl", Some(77)),
        ];
        Self(
            entries
                .into_iter()
                .map(|(model, limit)| (model.to_string(), limit))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_limits() {
        let limits = TokenLimits::default();
        assert_eq!(limits.limit_for("gpt-4-32k"), 32768);
        assert_eq!(limits.limit_for("anthropic.claude-v2"), 100_000);
    }

    #[test]
    fn unknown_and_unlimited_models_use_default() {
        let limits = TokenLimits::default();
        assert_eq!(limits.limit_for("mystery"), DEFAULT_TOKEN_LIMIT);
        assert_eq!(limits.limit_for("text-embedding-ada-002"), DEFAULT_TOKEN_LIMIT);
    }

    #[test]
    fn overrides_replace_builtin_entries() {
        let overrides = TokenLimits::from_json(r#"{"gpt-4": 128000, "llama-3": 8000}"#)
            .expect("parse overrides");
        let limits = TokenLimits::default().merged_with(overrides);
        assert_eq!(limits.limit_for("gpt-4"), 128_000);
        assert_eq!(limits.limit_for("llama-3"), 8000);
        assert_eq!(limits.limit_for("gpt-35-turbo"), 4096);
    }

    #[test]
    fn descriptor_defaults() {
        let descriptor: ModelDescriptor =
            serde_json::from_str(r#"{"id": "gpt-4"}"#).expect("deserialize");
        assert_eq!(descriptor.display_name(), "gpt-4");
        assert!(descriptor.capabilities.chat_completion);
        assert!(!descriptor.capabilities.embeddings);
        assert_eq!(
            descriptor.resolved_token_limit(&TokenLimits::default()),
            8192
        );
    }
}
