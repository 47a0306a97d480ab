//! Identifier types.
//!
//! Identifiers generated on the client (notifications, submission tickets)
//! use ULID format. Identifiers assigned by the backend are opaque and kept
//! exactly as the backend reported them.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed ID wrapper around ULID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new ID with a randomly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let prefix_with_underscore = concat!($prefix, "_");
                let ulid_str = s.strip_prefix(prefix_with_underscore).unwrap_or(s);

                Ulid::from_str(ulid_str)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Unique identifier for a notification surfaced to the user.
    NotificationId,
    "ntf"
);

define_id!(
    /// Ticket identifying one in-flight create/update/delete request.
    SubmissionTicket,
    "sub"
);

/// Backend-assigned identifier of a persisted integration.
///
/// The backend may report ids as JSON strings or numbers; both are kept
/// in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IntegrationId(String);

impl IntegrationId {
    /// Creates an id from its textual form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntegrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IntegrationId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                id_type: "IntegrationId",
                reason: "id is empty".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<u64> for IntegrationId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for IntegrationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Ok(Self(text)),
            Raw::Number(number) => Ok(Self::from(number)),
        }
    }
}

/// Identifier of the project (tenant) the integration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    /// Creates a project id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric id.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_id_display_format() {
        let id = NotificationId::new();
        assert!(id.to_string().starts_with("ntf_"));
    }

    #[test]
    fn parse_with_and_without_prefix() {
        let ticket = SubmissionTicket::new();
        let parsed: SubmissionTicket = ticket.to_string().parse().expect("should parse");
        assert_eq!(ticket, parsed);

        let raw: SubmissionTicket = ticket.as_ulid().to_string().parse().expect("should parse");
        assert_eq!(ticket, raw);
    }

    #[test]
    fn parse_invalid_ulid() {
        let err = "not_a_ulid".parse::<NotificationId>().unwrap_err();
        assert_eq!(err.id_type, "NotificationId");
    }

    #[test]
    fn integration_id_accepts_strings_and_numbers() {
        let from_text: IntegrationId = serde_json::from_str("\"42\"").expect("deserialize");
        let from_number: IntegrationId = serde_json::from_str("42").expect("deserialize");
        assert_eq!(from_text, from_number);
        assert_eq!(from_number.as_str(), "42");
    }

    #[test]
    fn integration_id_rejects_blank() {
        assert!("   ".parse::<IntegrationId>().is_err());
        assert_eq!(" 7 ".parse::<IntegrationId>().expect("parse").as_str(), "7");
    }

    #[test]
    fn project_id_serializes_as_number() {
        let json = serde_json::to_string(&ProjectId::new(3)).expect("serialize");
        assert_eq!(json, "3");
    }
}
