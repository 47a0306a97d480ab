//! Error types for the client crate.

use std::fmt;

/// Failures while setting up the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Configuration could not be loaded or is invalid.
    Config { reason: String },
    /// The HTTP client could not be built.
    ClientBuild { reason: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "invalid configuration: {reason}"),
            Self::ClientBuild { reason } => write!(f, "failed to build HTTP client: {reason}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}
