//! HTTP side of the AI DIAL settings widget.
//!
//! This crate provides:
//!
//! - **Transport**: [`HttpIntegrationsApi`], a reqwest implementation of the
//!   integrations API contract
//! - **Collaborators**: Azure-style model discovery and the `check_settings`
//!   connection test
//! - **Configuration**: [`ClientConfig`] loaded from file and environment
//! - **Host wiring**: [`SettingsWidget`] tying the controller to the above

pub mod collaborators;
pub mod config;
pub mod error;
pub mod http;
pub mod widget;

pub use collaborators::{AzureModelDiscovery, CheckSettingsTest};
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpIntegrationsApi;
pub use widget::SettingsWidget;
