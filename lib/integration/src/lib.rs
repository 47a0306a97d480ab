//! Lifecycle of the AI DIAL integration settings widget.
//!
//! This crate provides:
//!
//! - **Integration record**: the editable connection settings and their defaults
//! - **Lifecycle controller**: hydrate, edit, create, update, delete and reset
//! - **Field errors**: mapping backend validation failures onto form fields
//! - **Collaborators**: model discovery and connection test contracts
//! - **Widget events**: dialog visibility, change and notification events
//!
//! Transport is abstracted behind [`IntegrationsApi`] so the controller can
//! run against HTTP or an in-memory fake.

pub mod api;
pub mod catalog;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod field_errors;
pub mod lifecycle;
pub mod notification;
pub mod record;
pub mod settings;

pub use api::{ApiRequest, ApiResponse, ConnectionPayload, Endpoints, IntegrationsApi, Method};
pub use catalog::{Capabilities, ModelDescriptor, TokenLimits};
pub use collaborator::{
    ActionState, ConnectionSnapshot, ConnectionTest, ConnectionTestAction, DiscoveryAction,
    ModelDiscovery,
};
pub use config::WidgetConfig;
pub use error::{CollaboratorError, LifecycleError, TransportError, UnparseableErrorResponse};
pub use field_errors::{FieldErrorMap, ROOT_FIELD, ValidationIssue};
pub use lifecycle::{
    CHECK_CONNECTION_FIELD, CollaboratorUpdate, ErrorDisposition, IntegrationLifecycleController,
    MODELS_FIELD, Operation, PendingSubmission, SubmissionState, SubmitOutcome,
};
pub use notification::{
    ChangedEvent, Notification, NotificationLevel, ReopenHandle, WidgetEvent, WidgetEvents,
};
pub use record::{
    ConnectionParams, IntegrationRecord, IntegrationStatus, Mode, SavedIntegration, Secret,
};
pub use settings::PredictionSettings;
