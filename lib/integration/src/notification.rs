//! Events the widget emits to its host.

use crate::record::IntegrationRecord;
use chrono::{DateTime, Utc};
use dial_settings_core::NotificationId;
use std::fmt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::trace;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Danger,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Danger => f.write_str("danger"),
        }
    }
}

/// Handle that reopens the dialog for a specific record.
///
/// Carries the record as it was when the failed operation started, so the
/// host does not have to find the widget again by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReopenHandle {
    snapshot: IntegrationRecord,
}

impl ReopenHandle {
    pub(crate) fn new(snapshot: IntegrationRecord) -> Self {
        Self { snapshot }
    }

    /// The record the dialog will show.
    pub fn snapshot(&self) -> &IntegrationRecord {
        &self.snapshot
    }
}

/// A message shown to the user outside the form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub level: NotificationLevel,
    pub message: String,
    /// Persistent notifications stay until the user acts on them.
    pub persistent: bool,
    pub created_at: DateTime<Utc>,
    pub reopen: Option<ReopenHandle>,
}

impl Notification {
    /// A dismissible notification.
    #[must_use]
    pub fn transient(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            level,
            message: message.into(),
            persistent: false,
            created_at: Utc::now(),
            reopen: None,
        }
    }

    /// A persistent notification offering to reopen the dialog.
    #[must_use]
    pub fn with_reopen(message: impl Into<String>, handle: ReopenHandle) -> Self {
        Self {
            id: NotificationId::new(),
            level: NotificationLevel::Danger,
            message: message.into(),
            persistent: true,
            created_at: Utc::now(),
            reopen: Some(handle),
        }
    }
}

/// Payload of a successful create, update or delete.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedEvent {
    pub snapshot: IntegrationRecord,
    pub section: String,
}

/// Everything the widget tells its host.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    DialogShown,
    DialogHidden,
    Changed(ChangedEvent),
    Notify(Notification),
}

/// Sending half, owned by the controller.
#[derive(Debug, Clone)]
pub(crate) struct EventSink(UnboundedSender<WidgetEvent>);

impl EventSink {
    pub(crate) fn emit(&self, event: WidgetEvent) {
        if self.0.send(event).is_err() {
            trace!("widget event dropped, host stopped listening");
        }
    }
}

/// Receiving half, owned by the host.
#[derive(Debug)]
pub struct WidgetEvents(UnboundedReceiver<WidgetEvent>);

impl WidgetEvents {
    /// Returns the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<WidgetEvent> {
        match self.0.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Returns every queued event.
    pub fn drain(&mut self) -> Vec<WidgetEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

pub(crate) fn channel() -> (EventSink, WidgetEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink(tx), WidgetEvents(rx))
}
