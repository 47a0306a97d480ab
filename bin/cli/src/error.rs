use std::fmt;

/// Failures that end a CLI run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// An input file could not be read or parsed.
    Input { path: String, reason: String },
    /// The widget refused the operation in its current state.
    Rejected { reason: String },
    /// The operation ran but did not succeed.
    Failed { reason: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "configuration error: {reason}"),
            Self::Input { path, reason } => write!(f, "failed to read '{path}': {reason}"),
            Self::Rejected { reason } => write!(f, "operation rejected: {reason}"),
            Self::Failed { reason } => write!(f, "operation failed: {reason}"),
        }
    }
}

impl std::error::Error for CliError {}
