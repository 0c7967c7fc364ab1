//! Reconciliation logic for NetBird resources.
//!
//! One generic `Reconciler<K>` drives the create/update/delete state machine;
//! each resource kind plugs in through `ResourceKind`:
//! - `route`: NetworkRoute -> NetBird `/routes`
//! - `group`: NetbirdGroup -> NetBird `/groups`
//!
//! Reconciliation never talks to Kubernetes. It takes the declared spec and
//! the previous status and returns the status to persist plus an `Outcome`
//! telling the caller whether and when to try again.

pub mod group;
#[cfg(test)]
mod group_test;
pub mod route;

pub use group::GroupReconciler;
pub use route::RouteReconciler;

use crate::error::ReconcileError;
use crate::status::{build_status, extract_external_id, merge_condition};
use crds::NetbirdStatus;
use netbird_client::{Deletion, NetbirdClientTrait, NetbirdError};
use serde_json::Value;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Delay before a transient failure is retried
pub const RETRY_DELAY: Duration = Duration::from_secs(60);

/// Reason recorded when a delete fails
pub const DELETE_FAILED: &str = "DeleteFailed";

/// What the caller should do after a reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Remote state matches the declared spec
    Converged,
    /// Spec did not change; nothing was sent
    Unchanged,
    /// Nothing to do (delete without a known identifier)
    Skipped,
    /// Do not retry until the declared resource changes
    Permanent { reason: String, message: String },
    /// Retry after `after`
    Retry { after: Duration, reason: String, message: String },
}

impl Outcome {
    /// Short label used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Converged => "converged",
            Outcome::Unchanged => "unchanged",
            Outcome::Skipped => "skipped",
            Outcome::Permanent { .. } => "permanent",
            Outcome::Retry { .. } => "retry",
        }
    }
}

/// Result of one lifecycle event
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Status to persist; `None` leaves the current status untouched
    pub status: Option<NetbirdStatus>,
    pub outcome: Outcome,
}

impl Reconciliation {
    fn untouched(outcome: Outcome) -> Self {
        Self { status: None, outcome }
    }
}

/// A declared resource as seen by one lifecycle event
#[derive(Debug, Clone, Copy)]
pub struct ResourceEvent<'a> {
    /// `namespace/name`, for logging
    pub key: &'a str,
    pub spec: &'a Value,
    pub status: Option<&'a NetbirdStatus>,
    pub generation: Option<i64>,
}

/// Entry points driven by the event-delivery shell
#[async_trait::async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Kind label used in logs and metrics
    fn kind(&self) -> &'static str;

    async fn on_create(&self, event: ResourceEvent<'_>) -> Reconciliation;

    async fn on_update(&self, old_spec: &Value, event: ResourceEvent<'_>) -> Reconciliation;

    async fn on_delete(&self, event: ResourceEvent<'_>) -> Reconciliation;
}

/// Per-kind parsing, NetBird calls and reason tags
#[async_trait::async_trait]
pub trait ResourceKind: Send + Sync + 'static {
    type Spec: Debug + Clone + PartialEq + Send + Sync;

    /// Lowercase kind name ("route", "group")
    const KIND: &'static str;
    /// Capitalised kind name used in status messages
    const TITLE: &'static str;
    const CREATED: &'static str;
    const UPDATED: &'static str;
    const DELETED: &'static str;

    fn parse(raw: &Value) -> Result<Self::Spec, ReconcileError>;

    fn with_external_id(spec: Self::Spec, id: &str) -> Self::Spec;

    /// Create the remote object, returning its identifier
    async fn create(client: &dyn NetbirdClientTrait, spec: &Self::Spec) -> Result<Option<String>, NetbirdError>;

    /// Read-then-write update, returning the canonical identifier
    async fn update(client: &dyn NetbirdClientTrait, id: &str, spec: &Self::Spec) -> Result<Option<String>, NetbirdError>;

    async fn delete(client: &dyn NetbirdClientTrait, id: &str) -> Result<Deletion, NetbirdError>;
}

/// Reconciles one resource kind against NetBird.
pub struct Reconciler<K: ResourceKind> {
    client: Arc<dyn NetbirdClientTrait>,
    kind: PhantomData<K>,
}

impl<K: ResourceKind> Debug for Reconciler<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("kind", &K::KIND)
            .field("netbird_url", &self.client.base_url())
            .finish()
    }
}

impl<K: ResourceKind> Reconciler<K> {
    pub fn new(client: Arc<dyn NetbirdClientTrait>) -> Self {
        Self { client, kind: PhantomData }
    }

    /// Successful reconciliation, stamped with the processed generation
    fn synced(&self, event: &ResourceEvent<'_>, reason: &str, message: String, id: String) -> Reconciliation {
        let status = build_status(true, reason, message, Some(id), event.generation);
        Reconciliation {
            status: Some(merge_condition(event.status, status)),
            outcome: Outcome::Converged,
        }
    }

    /// Record a failure and classify it
    fn failed(&self, event: &ResourceEvent<'_>, action: &str, error: ReconcileError) -> Reconciliation {
        let reason = error.reason().to_string();
        let message = match &error {
            ReconcileError::Validation(msg) | ReconcileError::MissingExternalId(msg) => msg.clone(),
            ReconcileError::RemoteRejected(detail) => {
                format!("Failed to {} {}: API validation failed: {}", action, K::KIND, detail)
            }
            ReconcileError::RemoteUnavailable(msg) => format!("Failed to {} {}: {}", action, K::KIND, msg),
        };

        let status = build_status(false, &reason, message.clone(), None, None);
        let status = Some(merge_condition(event.status, status));

        if error.is_permanent() {
            error!("{} {} failed permanently ({}): {}", K::TITLE, event.key, reason, message);
            Reconciliation { status, outcome: Outcome::Permanent { reason, message } }
        } else {
            warn!("{} {} failed, retrying in {:?}: {}", K::TITLE, event.key, RETRY_DELAY, message);
            Reconciliation {
                status,
                outcome: Outcome::Retry { after: RETRY_DELAY, reason, message },
            }
        }
    }

    fn missing_id_in_response(action: &str) -> ReconcileError {
        ReconcileError::RemoteUnavailable(format!("NetBird {} response carried no id", action))
    }

    /// Normalized comparison of two declared specs
    fn unchanged(old: &Value, new: &Value) -> bool {
        if old == new {
            return true;
        }
        match (K::parse(old), K::parse(new)) {
            (Ok(old), Ok(new)) => old == new,
            _ => false,
        }
    }
}

#[async_trait::async_trait]
impl<K: ResourceKind> LifecycleHandler for Reconciler<K> {
    fn kind(&self) -> &'static str {
        K::KIND
    }

    async fn on_create(&self, event: ResourceEvent<'_>) -> Reconciliation {
        info!("Creating {} {}", K::KIND, event.key);

        let spec = match K::parse(event.spec) {
            Ok(spec) => spec,
            Err(e) => return self.failed(&event, "create", e),
        };
        debug!("Validated {} spec: {:?}", K::KIND, spec);

        // Already created: apply the declared state to the recorded id.
        // An id NetBird no longer knows falls through to a fresh create.
        if let Some(id) = extract_external_id(event.status) {
            info!("{} {} already exists in NetBird with ID {}, applying declared state", K::TITLE, event.key, id);
            let desired = K::with_external_id(spec.clone(), &id);
            match K::update(self.client.as_ref(), &id, &desired).await {
                Ok(Some(id)) => {
                    let message = format!("{} {} already existed, declared state applied", K::TITLE, id);
                    return self.synced(&event, K::CREATED, message, id);
                }
                Ok(None) => return self.failed(&event, "create", Self::missing_id_in_response("update")),
                Err(NetbirdError::NotFound(_)) => {
                    warn!("{} {} (ID {}) is gone from NetBird, creating it again", K::TITLE, event.key, id);
                }
                Err(e) => return self.failed(&event, "create", e.into()),
            }
        }

        match K::create(self.client.as_ref(), &spec).await {
            Ok(Some(id)) => {
                info!("Created {} {} with ID {}", K::KIND, event.key, id);
                let message = format!("{} {} created successfully", K::TITLE, id);
                self.synced(&event, K::CREATED, message, id)
            }
            Ok(None) => self.failed(&event, "create", Self::missing_id_in_response("create")),
            Err(e) => self.failed(&event, "create", e.into()),
        }
    }

    async fn on_update(&self, old_spec: &Value, event: ResourceEvent<'_>) -> Reconciliation {
        if Self::unchanged(old_spec, event.spec) {
            debug!("{} {} spec unchanged, skipping update", K::TITLE, event.key);
            return Reconciliation::untouched(Outcome::Unchanged);
        }

        let Some(id) = extract_external_id(event.status) else {
            let message = format!("No resource ID found in status for {} {}; cannot update", K::KIND, event.key);
            return self.failed(&event, "update", ReconcileError::MissingExternalId(message));
        };

        let spec = match K::parse(event.spec) {
            Ok(spec) => K::with_external_id(spec, &id),
            Err(e) => return self.failed(&event, "update", e),
        };

        info!("Updating {} {} (ID {})", K::KIND, event.key, id);
        match K::update(self.client.as_ref(), &id, &spec).await {
            Ok(Some(id)) => {
                let message = format!("{} {} updated successfully", K::TITLE, id);
                self.synced(&event, K::UPDATED, message, id)
            }
            Ok(None) => self.failed(&event, "update", Self::missing_id_in_response("update")),
            Err(e) => self.failed(&event, "update", e.into()),
        }
    }

    async fn on_delete(&self, event: ResourceEvent<'_>) -> Reconciliation {
        let Some(id) = extract_external_id(event.status) else {
            warn!("No resource ID found in status for {} {}, nothing to delete", K::KIND, event.key);
            return Reconciliation::untouched(Outcome::Skipped);
        };

        info!("Deleting {} {} (ID {})", K::KIND, event.key, id);
        match K::delete(self.client.as_ref(), &id).await {
            Ok(deletion) => {
                if deletion == Deletion::AlreadyAbsent {
                    info!("{} {} (ID {}) was already absent from NetBird", K::TITLE, event.key, id);
                }
                let status = build_status(false, K::DELETED, format!("{} deleted", K::TITLE), Some(id), None);
                Reconciliation {
                    status: Some(merge_condition(event.status, status)),
                    outcome: Outcome::Converged,
                }
            }
            Err(e) => {
                let message = format!("Failed to delete {} {}: {}", K::KIND, id, e);
                error!("{}", message);
                let status = build_status(false, DELETE_FAILED, message.clone(), Some(id), None);
                Reconciliation {
                    status: Some(merge_condition(event.status, status)),
                    outcome: Outcome::Permanent { reason: DELETE_FAILED.to_string(), message },
                }
            }
        }
    }
}
