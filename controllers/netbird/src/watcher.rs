//! Kubernetes resource watchers.
//!
//! Drives the `LifecycleHandler` entry points from kube_runtime::Controller:
//! - a finalizer turns deletion into `on_delete`
//! - the last-handled-spec annotation decides between `on_create` and
//!   `on_update`
//! - `Outcome::Retry` maps to a requeue, everything else waits for a change

use crate::error::ControllerError;
use crate::gate::{EventGate, GateDecision};
use crate::metrics::MetricsCollector;
use crate::reconciler::{LifecycleHandler, Outcome, Reconciliation, ResourceEvent, RETRY_DELAY};
use crds::{NetbirdGroup, NetbirdStatus, NetworkRoute};
use futures::StreamExt;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{watcher, Controller};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Finalizer guarding NetBird cleanup
pub const FINALIZER: &str = "gitops.netbird.io/finalizer";

/// Annotation holding the spec last reconciled successfully
pub const LAST_HANDLED_ANNOTATION: &str = "gitops.netbird.io/last-handled-spec";

/// Field manager for controller patches
const FIELD_MANAGER: &str = "netbird-controller";

/// A custom resource reconciled against NetBird
pub trait DeclaredResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    fn spec_value(&self) -> Result<Value, serde_json::Error>;

    fn netbird_status(&self) -> Option<&NetbirdStatus>;
}

impl DeclaredResource for NetworkRoute {
    fn spec_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.spec)
    }

    fn netbird_status(&self) -> Option<&NetbirdStatus> {
        self.status.as_ref()
    }
}

impl DeclaredResource for NetbirdGroup {
    fn spec_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.spec)
    }

    fn netbird_status(&self) -> Option<&NetbirdStatus> {
        self.status.as_ref()
    }
}

/// Shared state of one watcher
pub struct WatchContext {
    pub client: Client,
    pub handler: Arc<dyn LifecycleHandler>,
    pub metrics: MetricsCollector,
    pub gate: EventGate,
}

impl Debug for WatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchContext")
            .field("kind", &self.handler.kind())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

fn has_finalizer<K: Resource>(obj: &K) -> bool {
    obj.meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|s| s == FINALIZER))
}

async fn add_finalizer<K: DeclaredResource>(api: &Api<K>, obj: &K) -> Result<(), ControllerError> {
    let mut finalizers = obj.finalizers().to_vec();
    finalizers.push(FINALIZER.to_string());
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&obj.name_any(), &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

async fn remove_finalizer<K: DeclaredResource>(api: &Api<K>, obj: &K) -> Result<(), ControllerError> {
    let finalizers: Vec<String> = obj
        .finalizers()
        .iter()
        .filter(|s| *s != FINALIZER)
        .cloned()
        .collect();
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&obj.name_any(), &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Spec recorded by the last successful reconciliation
fn last_handled_spec<K: Resource>(obj: &K) -> Option<Value> {
    let raw = obj.meta().annotations.as_ref()?.get(LAST_HANDLED_ANNOTATION)?;
    match serde_json::from_str(raw) {
        Ok(spec) => Some(spec),
        Err(e) => {
            warn!("Ignoring malformed {} annotation: {}", LAST_HANDLED_ANNOTATION, e);
            None
        }
    }
}

async fn record_handled_spec<K: DeclaredResource>(api: &Api<K>, name: &str, spec: &Value) -> Result<(), ControllerError> {
    let patch = json!({
        "metadata": { "annotations": { LAST_HANDLED_ANNOTATION: serde_json::to_string(spec)? } }
    });
    api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

async fn write_status<K: DeclaredResource>(api: &Api<K>, name: &str, status: &NetbirdStatus) -> Result<(), ControllerError> {
    let patch = json!({ "status": status });
    api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

fn retry_after(outcome: &Outcome) -> Option<Duration> {
    match outcome {
        Outcome::Retry { after, .. } => Some(*after),
        _ => None,
    }
}

fn action_for(outcome: &Outcome) -> Action {
    match retry_after(outcome) {
        Some(after) => Action::requeue(after),
        None => Action::await_change(),
    }
}

async fn reconcile<K: DeclaredResource>(obj: Arc<K>, ctx: Arc<WatchContext>) -> Result<Action, ControllerError> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let key = format!("{}/{}", namespace, name);
    let generation = obj.meta().generation;
    let kind = ctx.handler.kind();

    match ctx.gate.check(&key, generation) {
        GateDecision::Run => {}
        GateDecision::Skip => {
            debug!("{} {} generation {:?} already handled", kind, key, generation);
            return Ok(Action::await_change());
        }
        GateDecision::Wait(remaining) => {
            debug!("{} {} retry pending in {:?}", kind, key, remaining);
            return Ok(Action::requeue(remaining));
        }
    }

    let api: Api<K> = Api::namespaced(ctx.client.clone(), &namespace);
    let spec = obj.spec_value()?;
    let event = ResourceEvent {
        key: &key,
        spec: &spec,
        status: obj.netbird_status(),
        generation,
    };

    if obj.meta().deletion_timestamp.is_some() {
        if !has_finalizer(obj.as_ref()) {
            ctx.gate.forget(&key);
            return Ok(Action::await_change());
        }

        let started = Instant::now();
        let Reconciliation { status, outcome } = ctx.handler.on_delete(event).await;
        ctx.metrics.observe(kind, "delete", outcome.label(), started.elapsed());

        if let Some(status) = &status {
            write_status(&api, &name, status).await?;
        }
        match outcome {
            Outcome::Converged | Outcome::Skipped => {
                remove_finalizer(&api, obj.as_ref()).await?;
                ctx.gate.forget(&key);
                info!("{} {} finalized", kind, key);
                Ok(Action::await_change())
            }
            other => {
                ctx.gate.record(&key, generation, retry_after(&other));
                Ok(action_for(&other))
            }
        }
    } else {
        if !has_finalizer(obj.as_ref()) {
            add_finalizer(&api, obj.as_ref()).await?;
        }

        let last = last_handled_spec(obj.as_ref());
        let started = Instant::now();
        let (event_name, Reconciliation { status, outcome }) = match &last {
            None => ("create", ctx.handler.on_create(event).await),
            Some(old) => ("update", ctx.handler.on_update(old, event).await),
        };
        ctx.metrics.observe(kind, event_name, outcome.label(), started.elapsed());

        if let Some(status) = &status {
            write_status(&api, &name, status).await?;
        }
        if outcome == Outcome::Converged && last.as_ref() != Some(&spec) {
            record_handled_spec(&api, &name, &spec).await?;
        }

        ctx.gate.record(&key, generation, retry_after(&outcome));
        Ok(action_for(&outcome))
    }
}

fn error_policy<K: DeclaredResource>(obj: Arc<K>, error: &ControllerError, ctx: Arc<WatchContext>) -> Action {
    error!(
        "Reconciliation error for {} {}/{}: {}",
        ctx.handler.kind(),
        obj.namespace().unwrap_or_default(),
        obj.name_any(),
        error
    );
    Action::requeue(RETRY_DELAY)
}

/// Watch `api` and reconcile every object through `ctx.handler` until the
/// watch stream ends.
pub async fn watch_resource<K: DeclaredResource>(api: Api<K>, ctx: Arc<WatchContext>) -> Result<(), ControllerError> {
    let kind = ctx.handler.kind();
    info!("Starting {} watcher", kind);

    // Debounce batches the echo of our own patches; concurrency is per kind
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(1))
        .concurrency(3);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .run(reconcile::<K>, error_policy::<K>, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!("Reconciled {} {}", kind, obj.name),
                Err(e) => error!("Controller error for {}: {}", kind, e),
            }
        })
        .await;

    Err(ControllerError::Watch(format!("{} watch stream ended", kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::NetworkRouteSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn route(annotations: Option<BTreeMap<String, String>>, finalizers: Option<Vec<String>>) -> NetworkRoute {
        NetworkRoute {
            metadata: ObjectMeta {
                name: Some("office".to_string()),
                namespace: Some("default".to_string()),
                annotations,
                finalizers,
                ..Default::default()
            },
            spec: NetworkRouteSpec {
                network: Some("10.0.0.0/24".to_string()),
                peer_id: Some("p1".to_string()),
                groups: Some(vec!["g1".to_string()]),
                network_id: Some("office".to_string()),
                ..Default::default()
            },
            status: None,
        }
    }

    #[test]
    fn test_has_finalizer() {
        assert!(!has_finalizer(&route(None, None)));
        assert!(!has_finalizer(&route(None, Some(vec!["other".to_string()]))));
        assert!(has_finalizer(&route(None, Some(vec![FINALIZER.to_string()]))));
    }

    #[test]
    fn test_last_handled_spec_annotation() {
        assert_eq!(last_handled_spec(&route(None, None)), None);

        let obj = route(None, None);
        let recorded = obj.spec_value().unwrap();
        let annotations = BTreeMap::from([(
            LAST_HANDLED_ANNOTATION.to_string(),
            serde_json::to_string(&recorded).unwrap(),
        )]);
        assert_eq!(last_handled_spec(&route(Some(annotations), None)), Some(recorded));

        let malformed = BTreeMap::from([(LAST_HANDLED_ANNOTATION.to_string(), "{not json".to_string())]);
        assert_eq!(last_handled_spec(&route(Some(malformed), None)), None);
    }

    #[test]
    fn test_spec_value_uses_wire_keys() {
        let value = route(None, None).spec_value().unwrap();
        assert_eq!(value["peerId"], "p1");
        assert_eq!(value["network_id"], "office");
        assert!(crate::spec::RouteSpec::parse(&value).is_ok());
    }

    #[test]
    fn test_actions_for_outcomes() {
        let retry = Outcome::Retry {
            after: RETRY_DELAY,
            reason: "Error".to_string(),
            message: String::new(),
        };
        assert_eq!(action_for(&retry), Action::requeue(RETRY_DELAY));
        assert_eq!(action_for(&Outcome::Converged), Action::await_change());
        assert_eq!(
            action_for(&Outcome::Permanent { reason: "RemoteRejected".to_string(), message: String::new() }),
            Action::await_change()
        );
        assert_eq!(retry_after(&Outcome::Skipped), None);
    }
}
