//! Error types for the integration crate.
//!
//! - `LifecycleError`: a controller operation was invoked in the wrong state
//! - `TransportError`: the HTTP request produced no response
//! - `CollaboratorError`: discovery or connection test failed
//! - `UnparseableErrorResponse`: a failure body was not structured field errors

use crate::api::ApiResponse;
use crate::lifecycle::Operation;
use dial_settings_core::{IntegrationId, SubmissionTicket};
use std::fmt;

/// Precondition failures of the lifecycle controller.
///
/// None of these change controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Another create/update/delete is still waiting for its response.
    SubmissionInFlight { ticket: SubmissionTicket },
    /// Create was requested for a record that already exists.
    AlreadyPersisted { id: IntegrationId },
    /// Update or delete was requested for a record that was never saved.
    NotPersisted { operation: Operation },
    /// The request body could not be built.
    InvalidPayload { reason: String },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmissionInFlight { ticket } => {
                write!(f, "submission {ticket} is still in flight")
            }
            Self::AlreadyPersisted { id } => {
                write!(f, "integration '{id}' already exists, use update")
            }
            Self::NotPersisted { operation } => {
                write!(f, "cannot {operation} an integration that was never saved")
            }
            Self::InvalidPayload { reason } => {
                write!(f, "failed to build request payload: {reason}")
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Failures that left no HTTP response to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be constructed.
    InvalidRequest { reason: String },
    /// Connecting to or talking with the endpoint failed.
    ConnectionFailed { endpoint: String, reason: String },
    /// The endpoint did not answer in time.
    Timeout { endpoint: String },
    /// The response body could not be read.
    BodyUnreadable { endpoint: String, reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::ConnectionFailed { endpoint, reason } => {
                write!(f, "failed to connect to '{endpoint}': {reason}")
            }
            Self::Timeout { endpoint } => write!(f, "request to '{endpoint}' timed out"),
            Self::BodyUnreadable { endpoint, reason } => {
                write!(f, "failed to read response from '{endpoint}': {reason}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Failures reported by the discovery and connection-test collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The backend answered with a non-success response.
    Rejected { response: ApiResponse },
    /// The endpoint could not be reached.
    Unreachable { endpoint: String, reason: String },
    /// The endpoint did not answer in time.
    Timeout { endpoint: String },
    /// The request could not be constructed.
    InvalidRequest { reason: String },
    /// The endpoint answered with something that is not the expected shape.
    InvalidResponse { reason: String },
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { response } => {
                write!(f, "request rejected with HTTP {}", response.status)
            }
            Self::Unreachable { endpoint, reason } => {
                write!(f, "failed to connect to '{endpoint}': {reason}")
            }
            Self::Timeout { endpoint } => write!(f, "request to '{endpoint}' timed out"),
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::InvalidResponse { reason } => write!(f, "unexpected response: {reason}"),
        }
    }
}

impl std::error::Error for CollaboratorError {}

impl From<TransportError> for CollaboratorError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { endpoint } => Self::Timeout { endpoint },
            TransportError::ConnectionFailed { endpoint, reason }
            | TransportError::BodyUnreadable { endpoint, reason } => {
                Self::Unreachable { endpoint, reason }
            }
            TransportError::InvalidRequest { reason } => Self::InvalidRequest { reason },
        }
    }
}

/// A failure body that is not a list of structured field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparseableErrorResponse {
    pub reason: String,
}

impl fmt::Display for UnparseableErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized error response: {}", self.reason)
    }
}

impl std::error::Error for UnparseableErrorResponse {}
