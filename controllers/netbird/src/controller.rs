//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the NetBird client,
//! the per-kind reconcilers, the watchers and the probe server together.
//!
//! The controller manages two CRD types:
//! - NetworkRoute: NetBird network routes
//! - NetbirdGroup: NetBird peer groups

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::gate::EventGate;
use crate::metrics::{self, MetricsCollector, ProbeState};
use crate::reconciler::{GroupReconciler, LifecycleHandler, RouteReconciler};
use crate::watcher::{watch_resource, DeclaredResource, WatchContext};
use crds::{NetbirdGroup, NetworkRoute};
use kube::{Api, Client};
use netbird_client::{NetbirdClient, NetbirdClientTrait};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Main controller for NetBird resource management.
#[derive(Debug)]
pub struct Controller {
    route_watcher: JoinHandle<Result<(), ControllerError>>,
    group_watcher: JoinHandle<Result<(), ControllerError>>,
    probe_server: JoinHandle<Result<(), ControllerError>>,
}

fn api_for<K: DeclaredResource>(client: &Client, namespace: Option<&str>) -> Api<K> {
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

fn spawn_watcher<K: DeclaredResource>(
    api: Api<K>,
    client: Client,
    handler: Arc<dyn LifecycleHandler>,
    metrics: MetricsCollector,
) -> JoinHandle<Result<(), ControllerError>> {
    let ctx = Arc::new(WatchContext {
        client,
        handler,
        metrics,
        gate: EventGate::new(),
    });
    tokio::spawn(watch_resource(api, ctx))
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing NetBird Controller");

        let metrics = MetricsCollector::new()?;
        let probes = Arc::new(ProbeState::new(metrics.clone()));
        let probe_server = tokio::spawn(metrics::serve(config.metrics_addr, probes.clone()));

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;

        // Create NetBird client
        let netbird_client = NetbirdClient::new(config.netbird_url.clone(), config.netbird_api_key.clone())?;

        // Validate token and connectivity before proceeding
        info!("Validating NetBird token and connectivity...");
        netbird_client.validate_token().await.map_err(|e| {
            error!("Failed to validate NetBird token: {}", e);
            error!("Please ensure:");
            error!("  1. NETBIRD_API_KEY environment variable is set correctly");
            error!("  2. The token is valid in NetBird");
            error!("  3. NetBird is reachable at {}", config.netbird_url);
            ControllerError::Netbird(e)
        })?;
        info!("NetBird token validated and connectivity established");

        let netbird_client: Arc<dyn NetbirdClientTrait> = Arc::new(netbird_client);
        let namespace = config.namespace.as_deref();

        let route_watcher = spawn_watcher(
            api_for::<NetworkRoute>(&kube_client, namespace),
            kube_client.clone(),
            Arc::new(RouteReconciler::new(netbird_client.clone())),
            metrics.clone(),
        );
        let group_watcher = spawn_watcher(
            api_for::<NetbirdGroup>(&kube_client, namespace),
            kube_client,
            Arc::new(GroupReconciler::new(netbird_client)),
            metrics,
        );

        probes.set_ready(true);

        Ok(Self {
            route_watcher,
            group_watcher,
            probe_server,
        })
    }

    /// Runs the controller until a background task exits.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("NetBird Controller running");

        // Watchers and the probe server run forever; any exit is fatal
        tokio::select! {
            result = &mut self.route_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("NetworkRoute watcher panicked: {}", e)))??;
            }
            result = &mut self.group_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("NetbirdGroup watcher panicked: {}", e)))??;
            }
            result = &mut self.probe_server => {
                result.map_err(|e| ControllerError::Metrics(format!("Probe server panicked: {}", e)))??;
            }
        }

        Ok(())
    }
}
