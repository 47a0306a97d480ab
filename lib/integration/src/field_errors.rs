//! Field-level validation errors reported by the backend.
//!
//! The backend rejects submissions with a JSON array of
//! `{"loc": [field, ...], "msg": "..."}` items. The first `loc` segment names
//! the field; the rest is ignored.

use crate::error::UnparseableErrorResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Key used for errors that do not name a field.
pub const ROOT_FIELD: &str = "__root__";

/// One structured validation error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationIssue {
    pub loc: Vec<JsonValue>,
    pub msg: String,
}

impl ValidationIssue {
    /// Returns the field the issue refers to.
    #[must_use]
    pub fn field(&self) -> String {
        match self.loc.first() {
            Some(JsonValue::String(field)) => field.clone(),
            Some(other) => other.to_string(),
            None => ROOT_FIELD.to_string(),
        }
    }
}

/// Field name to validation message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrorMap(BTreeMap<String, String>);

impl FieldErrorMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding exactly one error.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.into(), message.into());
        Self(map)
    }

    /// Builds a map from validation issues. Later issues for the same field
    /// win.
    pub fn from_issues(issues: impl IntoIterator<Item = ValidationIssue>) -> Self {
        Self(
            issues
                .into_iter()
                .map(|issue| (issue.field(), issue.msg))
                .collect(),
        )
    }

    /// Parses a structured error response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON array of validation issues.
    pub fn parse(body: &str) -> Result<Self, UnparseableErrorResponse> {
        serde_json::from_str::<Vec<ValidationIssue>>(body)
            .map(Self::from_issues)
            .map_err(|e| UnparseableErrorResponse {
                reason: e.to_string(),
            })
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
