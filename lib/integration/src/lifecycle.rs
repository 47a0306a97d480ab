//! Lifecycle controller of the integration settings widget.
//!
//! The controller owns the record being edited, the field errors shown next
//! to the form and the in-flight submission. Hosts drive it with field edits,
//! collaborator results and submissions, and listen to [`WidgetEvent`]s.
//!
//! ```text
//! Idle --open/hydrate--> Editing --submit--> Submitting --ok--> Idle (closed, reset)
//!                                                      \--error--> Editing
//! Editing --close/cancel--> Idle (closed, reset)
//! ```

use crate::api::{ApiRequest, ApiResponse, Endpoints, IntegrationsApi, Method, SnapshotPayload};
use crate::collaborator::{ConnectionSnapshot, DiscoveryAction};
use crate::config::WidgetConfig;
use crate::error::{CollaboratorError, LifecycleError, TransportError};
use crate::field_errors::FieldErrorMap;
use crate::notification::{
    self, ChangedEvent, EventSink, Notification, NotificationLevel, ReopenHandle, WidgetEvent,
    WidgetEvents,
};
use crate::record::{IntegrationRecord, OpaqueConfig, SavedIntegration, Secret};
use dial_settings_core::{IntegrationId, SubmissionTicket};
use rootcause::prelude::Report;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Field key for discovery failures that carry no field errors.
pub const MODELS_FIELD: &str = "models";

/// Field key for connection-test failures that carry no field errors.
pub const CHECK_CONNECTION_FIELD: &str = "check_connection";

/// A mutating network operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
}

/// A submission that has been started but not finished.
#[derive(Debug)]
pub struct PendingSubmission {
    ticket: SubmissionTicket,
    operation: Operation,
    request: ApiRequest,
    snapshot: IntegrationRecord,
    session: u64,
}

impl PendingSubmission {
    pub fn ticket(&self) -> SubmissionTicket {
        self.ticket
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The request to send.
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// The record as it was when the submission started.
    pub fn snapshot(&self) -> &IntegrationRecord {
        &self.snapshot
    }
}

/// Result of a create, update or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Create or update succeeded.
    Saved(IntegrationRecord),
    /// Delete succeeded; the record no longer has an identity.
    Deleted(IntegrationRecord),
    /// The backend rejected specific fields.
    Invalid(FieldErrorMap),
    /// The request failed without usable field errors.
    Failed { message: String },
}

/// How a failure response was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDisposition {
    Fields(FieldErrorMap),
    Unparseable { message: String },
}

impl ErrorDisposition {
    fn from_response(response: &ApiResponse) -> Self {
        match FieldErrorMap::parse(&response.body) {
            Ok(fields) => Self::Fields(fields),
            Err(e) => Self::Unparseable {
                message: format!("Request failed (HTTP {}): {e}", response.status),
            },
        }
    }

    fn summary(&self) -> String {
        match self {
            Self::Fields(fields) => fields
                .iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>()
                .join("; "),
            Self::Unparseable { message } => message.clone(),
        }
    }

    fn into_outcome(self) -> SubmitOutcome {
        match self {
            Self::Fields(fields) => SubmitOutcome::Invalid(fields),
            Self::Unparseable { message } => SubmitOutcome::Failed { message },
        }
    }
}

/// What a collaborator result did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorUpdate {
    Applied,
    /// The connection parameters changed since the collaborator started.
    Stale,
    Failed,
}

/// Owns and mutates the state of one settings widget.
pub struct IntegrationLifecycleController {
    config: WidgetConfig,
    endpoints: Endpoints,
    api: Arc<dyn IntegrationsApi>,
    record: IntegrationRecord,
    errors: FieldErrorMap,
    in_flight: Option<SubmissionTicket>,
    dialog_open: bool,
    /// Incremented whenever the form starts over (hydrate, reset).
    session: u64,
    discovery: Option<DiscoveryAction>,
    events: EventSink,
}

impl IntegrationLifecycleController {
    /// Creates a closed widget with a fresh record.
    pub fn new(config: WidgetConfig, api: Arc<dyn IntegrationsApi>) -> (Self, WidgetEvents) {
        let (events, receiver) = notification::channel();
        let controller = Self {
            endpoints: Endpoints::new(config.integrations_url.clone()),
            record: IntegrationRecord::fresh(config.mode.clone()),
            config,
            api,
            errors: FieldErrorMap::new(),
            in_flight: None,
            dialog_open: false,
            session: 0,
            discovery: None,
            events,
        };
        (controller, receiver)
    }

    /// Attaches the discovery action so `reset` can clear it.
    #[must_use]
    pub fn with_discovery(mut self, discovery: DiscoveryAction) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// The record being edited.
    pub fn record(&self) -> &IntegrationRecord {
        &self.record
    }

    pub fn field_errors(&self) -> &FieldErrorMap {
        &self.errors
    }

    pub fn submission_state(&self) -> SubmissionState {
        if self.in_flight.is_some() {
            SubmissionState::Submitting
        } else {
            SubmissionState::Idle
        }
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open
    }

    /// Opens the dialog for a new integration.
    pub fn open_new(&mut self) {
        self.reset();
        self.show_dialog();
    }

    /// Replaces the whole state with a saved record and opens the dialog.
    pub fn hydrate(&mut self, record: IntegrationRecord) {
        debug!(
            integration_id = ?record.identity(),
            model_count = record.discovered_models().len(),
            "hydrating integration"
        );
        self.record = record;
        self.errors = FieldErrorMap::new();
        self.session += 1;
        self.show_dialog();
    }

    /// Hydrates from an entry of the host's integration listing.
    pub fn hydrate_saved(&mut self, saved: SavedIntegration) {
        let record = saved.into_record(self.config.mode.clone());
        self.hydrate(record);
    }

    /// Restores the fresh-record defaults and clears the discovery action.
    ///
    /// An in-flight submission keeps its ticket; its response is still
    /// processed when it arrives.
    pub fn reset(&mut self) {
        self.record = IntegrationRecord::fresh(self.config.mode.clone());
        self.errors = FieldErrorMap::new();
        self.session += 1;
        if let Some(discovery) = &self.discovery {
            discovery.clear();
        }
    }

    /// Hides the dialog and resets.
    pub fn close(&mut self) {
        self.hide_dialog();
        self.reset();
    }

    pub fn cancel(&mut self) {
        self.close();
    }

    /// Reopens the dialog for the record captured in a notification.
    pub fn reopen(&mut self, handle: &ReopenHandle) {
        self.hydrate(handle.snapshot().clone());
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        if self.record.set_base_url(base_url) {
            debug!("base URL changed, discovered models cleared");
        }
    }

    pub fn set_api_version(&mut self, api_version: impl Into<String>) {
        self.record.set_api_version(api_version);
    }

    pub fn set_credential(&mut self, credential: Secret) {
        self.record.set_credential(credential);
    }

    pub fn set_default(&mut self, is_default: bool) {
        self.record.set_default(is_default);
    }

    pub fn set_opaque_config(&mut self, config: OpaqueConfig) {
        self.record.set_opaque_config(config);
    }

    /// The connection parameters a collaborator should work with.
    pub fn connection_snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            params: self.record.connection_params().clone(),
            credential: self.record.credential().clone(),
            project_id: self.config.project_id,
        }
    }

    /// Applies the result of a model discovery started from `snapshot`.
    pub fn on_models_discovered(
        &mut self,
        snapshot: &ConnectionSnapshot,
        result: Result<Vec<String>, CollaboratorError>,
    ) -> CollaboratorUpdate {
        if !snapshot.matches(self.record.connection_params()) {
            debug!("discarding model discovery result for outdated connection parameters");
            return CollaboratorUpdate::Stale;
        }
        match result {
            Ok(models) => {
                debug!(model_count = models.len(), "models discovered");
                self.record.set_discovered_models(models);
                CollaboratorUpdate::Applied
            }
            Err(err) => {
                self.apply_collaborator_error(MODELS_FIELD, err);
                CollaboratorUpdate::Failed
            }
        }
    }

    /// Applies the result of a connection test started from `snapshot`.
    pub fn on_connection_tested(
        &mut self,
        snapshot: &ConnectionSnapshot,
        result: Result<(), CollaboratorError>,
    ) -> CollaboratorUpdate {
        if !snapshot.matches(self.record.connection_params()) {
            debug!("discarding connection test result for outdated connection parameters");
            return CollaboratorUpdate::Stale;
        }
        match result {
            Ok(()) => {
                self.errors.remove(CHECK_CONNECTION_FIELD);
                CollaboratorUpdate::Applied
            }
            Err(err) => {
                self.apply_collaborator_error(CHECK_CONNECTION_FIELD, err);
                CollaboratorUpdate::Failed
            }
        }
    }

    fn apply_collaborator_error(&mut self, field: &str, err: CollaboratorError) {
        debug!(field, error = %err, "collaborator failed");
        match err {
            CollaboratorError::Rejected { response } => {
                self.handle_error(&response);
            }
            other => {
                self.errors = FieldErrorMap::single(field, other.to_string());
            }
        }
    }

    /// Interprets a failure response.
    ///
    /// Structured field errors replace the field error map. Anything else
    /// empties the map and raises a generic notification.
    pub fn handle_error(&mut self, response: &ApiResponse) -> ErrorDisposition {
        let disposition = ErrorDisposition::from_response(response);
        self.apply_disposition(&disposition);
        disposition
    }

    fn apply_disposition(&mut self, disposition: &ErrorDisposition) {
        match disposition {
            ErrorDisposition::Fields(fields) => {
                self.errors = fields.clone();
            }
            ErrorDisposition::Unparseable { message } => {
                self.errors = FieldErrorMap::new();
                self.notify(Notification::transient(NotificationLevel::Danger, message));
            }
        }
    }

    /// Starts a submission.
    ///
    /// The request body is built from the record as it is now.
    ///
    /// # Errors
    ///
    /// Returns an error without changing any state if another submission is
    /// in flight or the record's identity does not fit the operation.
    pub fn begin(&mut self, operation: Operation) -> Result<PendingSubmission, LifecycleError> {
        if let Some(ticket) = self.in_flight {
            debug!(%operation, %ticket, "submission rejected, another one is in flight");
            return Err(LifecycleError::SubmissionInFlight { ticket });
        }

        let request = match (operation, self.record.identity()) {
            (Operation::Create, Some(id)) => {
                return Err(LifecycleError::AlreadyPersisted { id: id.clone() });
            }
            (Operation::Update | Operation::Delete, None) => {
                return Err(LifecycleError::NotPersisted { operation });
            }
            (Operation::Create, None) => ApiRequest::new(
                Method::Post,
                self.endpoints.create(&self.config.plugin_name),
                Some(self.payload()?),
            ),
            (Operation::Update, Some(id)) => {
                ApiRequest::new(Method::Put, self.endpoints.update(id), Some(self.payload()?))
            }
            (Operation::Delete, Some(id)) => ApiRequest::new(
                Method::Delete,
                self.endpoints.delete(self.config.project_id, id),
                None,
            ),
        };

        let ticket = SubmissionTicket::new();
        self.in_flight = Some(ticket);
        debug!(%operation, %ticket, url = %request.url, "submission started");

        Ok(PendingSubmission {
            ticket,
            operation,
            request,
            snapshot: self.record.clone(),
            session: self.session,
        })
    }

    fn payload(&self) -> Result<serde_json::Value, LifecycleError> {
        serde_json::to_value(SnapshotPayload::new(&self.record, self.config.project_id)).map_err(
            |e| LifecycleError::InvalidPayload {
                reason: e.to_string(),
            },
        )
    }

    /// Completes a submission with whatever the transport produced.
    pub fn finish(
        &mut self,
        pending: PendingSubmission,
        result: Result<ApiResponse, Report<TransportError>>,
    ) -> SubmitOutcome {
        if self.in_flight == Some(pending.ticket) {
            self.in_flight = None;
        }

        let disposition = match result {
            Ok(response) if response.is_success() => {
                return self.complete(pending, &response);
            }
            Ok(response) => {
                warn!(
                    operation = %pending.operation,
                    status = response.status,
                    "submission rejected by backend"
                );
                ErrorDisposition::from_response(&response)
            }
            Err(report) => {
                warn!(operation = %pending.operation, error = %report, "submission failed");
                ErrorDisposition::Unparseable {
                    message: format!("Failed to {} integration: {report}", pending.operation),
                }
            }
        };

        if pending.session == self.session {
            self.apply_disposition(&disposition);
        } else {
            self.notify(Notification::transient(
                NotificationLevel::Danger,
                format!(
                    "Failed to {} integration: {}",
                    pending.operation,
                    disposition.summary()
                ),
            ));
        }

        if pending.operation == Operation::Delete {
            self.notify(Notification::with_reopen(
                "Deletion error. Reopen the integration to review its settings.",
                ReopenHandle::new(pending.snapshot),
            ));
        }

        disposition.into_outcome()
    }

    fn complete(&mut self, pending: PendingSubmission, response: &ApiResponse) -> SubmitOutcome {
        let current = pending.session == self.session;
        let operation = pending.operation;
        let mut snapshot = pending.snapshot;

        match operation {
            Operation::Create => {
                if let Some(id) = response.created_id() {
                    snapshot.set_identity(Some(id));
                }
            }
            Operation::Update => {}
            Operation::Delete => snapshot.set_identity(None),
        }

        info!(
            %operation,
            integration_id = ?snapshot.identity(),
            section = %self.config.section,
            "integration {operation} succeeded"
        );

        if current {
            self.hide_dialog();
        }
        self.events.emit(WidgetEvent::Changed(ChangedEvent {
            snapshot: snapshot.clone(),
            section: self.config.section.clone(),
        }));
        if current {
            self.reset();
        }

        match operation {
            Operation::Create | Operation::Update => SubmitOutcome::Saved(snapshot),
            Operation::Delete => SubmitOutcome::Deleted(snapshot),
        }
    }

    #[instrument(skip(self))]
    async fn submit(&mut self, operation: Operation) -> Result<SubmitOutcome, LifecycleError> {
        let pending = self.begin(operation)?;
        let api = Arc::clone(&self.api);
        let result = api.send(pending.request()).await;
        Ok(self.finish(pending, result))
    }

    /// Saves a new integration.
    ///
    /// # Errors
    ///
    /// Fails without side effects if a submission is in flight or the record
    /// already has an identity. Network failures are reported through the
    /// outcome instead.
    pub async fn create(&mut self) -> Result<SubmitOutcome, LifecycleError> {
        self.submit(Operation::Create).await
    }

    /// Saves changes to an existing integration.
    ///
    /// # Errors
    ///
    /// Fails without side effects if a submission is in flight or the record
    /// has no identity.
    pub async fn update(&mut self) -> Result<SubmitOutcome, LifecycleError> {
        self.submit(Operation::Update).await
    }

    /// Deletes the integration.
    ///
    /// # Errors
    ///
    /// Fails without side effects if a submission is in flight or the record
    /// has no identity.
    pub async fn delete(&mut self) -> Result<SubmitOutcome, LifecycleError> {
        self.submit(Operation::Delete).await
    }

    /// Deletes an integration straight from the host's listing.
    ///
    /// # Errors
    ///
    /// Fails without side effects if a submission is in flight.
    pub async fn delete_by_identity(
        &mut self,
        id: IntegrationId,
    ) -> Result<SubmitOutcome, LifecycleError> {
        if let Some(ticket) = self.in_flight {
            return Err(LifecycleError::SubmissionInFlight { ticket });
        }
        self.record.set_identity(Some(id));
        self.delete().await
    }

    fn show_dialog(&mut self) {
        if !self.dialog_open {
            self.dialog_open = true;
            self.events.emit(WidgetEvent::DialogShown);
        }
    }

    fn hide_dialog(&mut self) {
        if self.dialog_open {
            self.dialog_open = false;
            self.events.emit(WidgetEvent::DialogHidden);
        }
    }

    fn notify(&self, notification: Notification) {
        debug!(
            level = %notification.level,
            persistent = notification.persistent,
            "notification raised"
        );
        self.events.emit(WidgetEvent::Notify(notification));
    }
}

impl fmt::Debug for IntegrationLifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationLifecycleController")
            .field("record", &self.record)
            .field("errors", &self.errors)
            .field("in_flight", &self.in_flight)
            .field("dialog_open", &self.dialog_open)
            .finish_non_exhaustive()
    }
}
