//! Contracts for the model-discovery and connection-test collaborators.
//!
//! Collaborators never touch controller state. They receive a
//! [`ConnectionSnapshot`], do their work, and the host hands the result back
//! to the controller together with the snapshot it was started from.

use crate::error::CollaboratorError;
use crate::record::{ConnectionParams, Secret};
use async_trait::async_trait;
use dial_settings_core::ProjectId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Connection parameters and credential lent to a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub params: ConnectionParams,
    pub credential: Secret,
    pub project_id: ProjectId,
}

impl ConnectionSnapshot {
    /// Returns true if the snapshot was taken for `params`.
    #[must_use]
    pub fn matches(&self, params: &ConnectionParams) -> bool {
        &self.params == params
    }
}

/// Lists the models reachable with a set of connection parameters.
#[async_trait]
pub trait ModelDiscovery: Send + Sync {
    /// Returns model names in the order the backend reports them.
    async fn discover(&self, snapshot: &ConnectionSnapshot)
    -> Result<Vec<String>, CollaboratorError>;
}

/// Verifies that a set of connection parameters works.
#[async_trait]
pub trait ConnectionTest: Send + Sync {
    async fn test(&self, snapshot: &ConnectionSnapshot) -> Result<(), CollaboratorError>;
}

/// Transient state owned by a collaborator action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionState {
    pub busy: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct SharedState(Arc<Mutex<ActionState>>);

impl SharedState {
    fn lock(&self) -> MutexGuard<'_, ActionState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the action busy. Returns false if it already was.
    fn try_start(&self) -> bool {
        let mut state = self.lock();
        if state.busy {
            return false;
        }
        state.busy = true;
        state.last_error = None;
        true
    }

    fn finish(&self, error: Option<String>) {
        let mut state = self.lock();
        state.busy = false;
        state.last_error = error;
    }
}

impl Clone for SharedState {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// The "load models" action with its own busy flag.
#[derive(Clone)]
pub struct DiscoveryAction {
    discovery: Arc<dyn ModelDiscovery>,
    state: SharedState,
}

impl DiscoveryAction {
    #[must_use]
    pub fn new(discovery: Arc<dyn ModelDiscovery>) -> Self {
        Self {
            discovery,
            state: SharedState::default(),
        }
    }

    pub fn state(&self) -> ActionState {
        self.state.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Runs discovery for `snapshot`.
    ///
    /// Returns `None` without issuing a request if discovery is already
    /// running.
    pub async fn run(
        &self,
        snapshot: &ConnectionSnapshot,
    ) -> Option<Result<Vec<String>, CollaboratorError>> {
        if !self.state.try_start() {
            debug!("model discovery already running");
            return None;
        }
        let result = self.discovery.discover(snapshot).await;
        self.state.finish(result.as_ref().err().map(ToString::to_string));
        Some(result)
    }

    /// Forgets any transient state.
    pub fn clear(&self) {
        *self.state.lock() = ActionState::default();
    }
}

/// The "test connection" action with its own busy flag.
#[derive(Clone)]
pub struct ConnectionTestAction {
    test: Arc<dyn ConnectionTest>,
    state: SharedState,
}

impl ConnectionTestAction {
    #[must_use]
    pub fn new(test: Arc<dyn ConnectionTest>) -> Self {
        Self {
            test,
            state: SharedState::default(),
        }
    }

    pub fn state(&self) -> ActionState {
        self.state.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Runs the connection test for `snapshot`.
    ///
    /// Returns `None` without issuing a request if a test is already running.
    pub async fn run(&self, snapshot: &ConnectionSnapshot) -> Option<Result<(), CollaboratorError>> {
        if !self.state.try_start() {
            debug!("connection test already running");
            return None;
        }
        let result = self.test.test(snapshot).await;
        self.state.finish(result.as_ref().err().map(ToString::to_string));
        Some(result)
    }
}
