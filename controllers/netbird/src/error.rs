//! Controller-specific error types.
//!
//! `ReconcileError` is the failure taxonomy of a single reconciliation and
//! decides both the status reason and whether the event is retried.
//! `ControllerError` covers the process shell around it (Kubernetes API,
//! configuration, watchers, metrics).

use kube::Error as KubeError;
use netbird_client::NetbirdError;
use thiserror::Error;

/// Failure of a single reconciliation attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// Declared spec is malformed or incomplete
    #[error("{0}")]
    Validation(String),

    /// No NetBird identifier is known for the resource
    #[error("{0}")]
    MissingExternalId(String),

    /// NetBird rejected the request content (HTTP 422)
    #[error("{0}")]
    RemoteRejected(String),

    /// Transport failure or any other non-2xx response
    #[error("{0}")]
    RemoteUnavailable(String),
}

impl ReconcileError {
    /// Status reason tag for this failure
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::Validation(_) => "ValidationError",
            ReconcileError::MissingExternalId(_) => "MissingExternalId",
            ReconcileError::RemoteRejected(_) => "RemoteRejected",
            ReconcileError::RemoteUnavailable(_) => "Error",
        }
    }

    /// Permanent failures need a spec change before another attempt can succeed
    pub fn is_permanent(&self) -> bool {
        !matches!(self, ReconcileError::RemoteUnavailable(_))
    }
}

impl From<NetbirdError> for ReconcileError {
    fn from(error: NetbirdError) -> Self {
        match error {
            NetbirdError::Rejected(detail) => ReconcileError::RemoteRejected(detail),
            NetbirdError::InvalidConfig(msg) => ReconcileError::Validation(msg),
            other => ReconcileError::RemoteUnavailable(other.to_string()),
        }
    }
}

/// Errors that can occur in the NetBird Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// NetBird API error
    #[error("NetBird error: {0}")]
    Netbird(#[from] NetbirdError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Spec, status or annotation (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Metrics registry or endpoint failure
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl From<prometheus::Error> for ControllerError {
    fn from(error: prometheus::Error) -> Self {
        ControllerError::Metrics(error.to_string())
    }
}
