//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use dial_settings_core::IntegrationId;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dial-settings")]
#[command(about = "Manage AI DIAL integrations from the command line")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML or JSON). Environment variables prefixed
    /// with `DIAL_SETTINGS__` override it.
    #[arg(long, global = true, env = "DIAL_SETTINGS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new integration.
    Create {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Discover models before saving.
        #[arg(long)]
        discover: bool,

        /// Make this the project's default integration.
        #[arg(long)]
        default: bool,
    },
    /// Update an existing integration.
    Update {
        /// Saved integration as JSON, as returned by the integrations listing.
        #[arg(long)]
        saved: PathBuf,

        /// Replacements for the saved connection parameters.
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Discover models before saving.
        #[arg(long)]
        discover: bool,
    },
    /// Delete an integration.
    Delete {
        /// Integration identifier.
        #[arg(long)]
        id: IntegrationId,
    },
    /// List the models reachable with the given connection.
    Discover {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Check that the given connection works.
    Test {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Validate a prediction settings file.
    ValidateSettings {
        /// JSON file with prediction settings.
        file: PathBuf,
    },
}

/// Connection parameters. Unset values keep the record's current ones.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// API base URL. Changing it clears discovered models.
    #[arg(long)]
    pub api_base: Option<String>,

    /// API version.
    #[arg(long)]
    pub api_version: Option<String>,

    /// API token.
    #[arg(long, env = "DIAL_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
}
