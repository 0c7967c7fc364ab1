//! NetBird Controller
//!
//! Keeps NetBird in line with the declared resources in the cluster:
//! - NetworkRoute: creates, updates and deletes NetBird network routes
//! - NetbirdGroup: creates, updates and deletes NetBird peer groups
//!
//! Configuration comes from the environment (`NETBIRD_URL`,
//! `NETBIRD_API_KEY`, `WATCH_NAMESPACE`, `METRICS_ADDR`).

mod config;
mod controller;
mod error;
mod gate;
mod metrics;
mod reconciler;
mod spec;
mod status;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::error::ControllerError;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info,netbird_controller=debug";

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    // kube and reqwest both use rustls; pin the ring provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| ControllerError::InvalidConfig("Failed to install rustls ring crypto provider".to_string()))?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    info!("Starting NetBird Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  NetBird URL: {}", config.netbird_url);
    info!("  NetBird API key: {}", config.redacted_api_key());
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Metrics address: {}", config.metrics_addr);

    let controller = Controller::new(config).await?;
    controller.run().await
}
