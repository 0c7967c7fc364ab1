//! Prometheus metrics and HTTP probe endpoints.
//!
//! Serves `/metrics`, `/healthz` and `/readyz` on `METRICS_ADDR`.

use crate::error::ControllerError;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Prometheus metrics collector for reconciliations
#[derive(Clone)]
pub struct MetricsCollector {
    /// Reconciliations by kind, lifecycle event and outcome
    pub reconcile_total: CounterVec,
    /// Reconciliation latency in seconds
    pub reconcile_duration_seconds: HistogramVec,
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector").finish_non_exhaustive()
    }
}

impl MetricsCollector {
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Arc::new(Registry::new());

        let reconcile_total = CounterVec::new(
            Opts::new("netbird_reconcile_total", "Total reconciliations"),
            &["kind", "event", "outcome"],
        )?;

        let reconcile_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "netbird_reconcile_duration_seconds",
                "Reconciliation latency in seconds",
            ),
            &["kind", "event"],
        )?;

        registry.register(Box::new(reconcile_total.clone()))?;
        registry.register(Box::new(reconcile_duration_seconds.clone()))?;

        Ok(Self {
            reconcile_total,
            reconcile_duration_seconds,
            registry,
        })
    }

    /// Record one finished lifecycle event
    pub fn observe(&self, kind: &str, event: &str, outcome: &str, elapsed: Duration) {
        self.reconcile_total
            .with_label_values(&[kind, event, outcome])
            .inc();
        self.reconcile_duration_seconds
            .with_label_values(&[kind, event])
            .observe(elapsed.as_secs_f64());
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, ControllerError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ControllerError::Metrics(e.to_string()))
    }
}

/// Shared state of the probe server
#[derive(Debug)]
pub struct ProbeState {
    pub metrics: MetricsCollector,
    ready: AtomicBool,
}

impl ProbeState {
    pub fn new(metrics: MetricsCollector) -> Self {
        Self {
            metrics,
            ready: AtomicBool::new(false),
        }
    }

    /// Flip readiness once NetBird is reachable and watchers are running
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

pub async fn metrics_handler(State(state): State<Arc<ProbeState>>) -> impl IntoResponse {
    match state.metrics.gather() {
        Ok(body) => (StatusCode::OK, [("content-type", "text/plain; version=0.0.4")], body),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; version=0.0.4")],
                e.to_string(),
            )
        }
    }
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<Arc<ProbeState>>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

pub fn router(state: Arc<ProbeState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

/// Serve the probe endpoints until the process exits
pub async fn serve(addr: SocketAddr, state: Arc<ProbeState>) -> Result<(), ControllerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ControllerError::Metrics(format!("Failed to bind {}: {}", addr, e)))?;
    info!("Metrics and probes listening on {}", addr);
    axum::serve(listener, router(state))
        .await
        .map_err(|e| ControllerError::Metrics(format!("Probe server failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_observe_is_gathered() {
        let metrics = MetricsCollector::new().unwrap();
        metrics.observe("route", "create", "converged", Duration::from_millis(12));
        metrics.observe("route", "create", "converged", Duration::from_millis(8));

        let text = metrics.gather().unwrap();
        assert!(text.contains(r#"netbird_reconcile_total{event="create",kind="route",outcome="converged"} 2"#), "{}", text);
        assert!(text.contains("netbird_reconcile_duration_seconds"));
    }

    #[tokio::test]
    async fn test_readyz_follows_state() {
        let state = Arc::new(ProbeState::new(MetricsCollector::new().unwrap()));

        let response = readyz(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.set_ready(true);
        let response = readyz(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = Arc::new(ProbeState::new(MetricsCollector::new().unwrap()));
        state.metrics.observe("group", "delete", "skipped", Duration::ZERO);

        let response = metrics_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("kind=\"group\""));
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = healthz().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }
}
