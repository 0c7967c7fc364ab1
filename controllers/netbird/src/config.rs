//! Controller configuration loaded from the environment.

use crate::error::ControllerError;
use std::net::SocketAddr;

/// Default bind address for the metrics and probe endpoints
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8080";

/// Runtime configuration for the NetBird Controller
#[derive(Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// NetBird management API base URL (e.g., "https://api.netbird.io/api")
    pub netbird_url: String,
    /// NetBird API token
    pub netbird_api_key: String,
    /// Namespace to watch; all namespaces when unset
    pub namespace: Option<String>,
    pub metrics_addr: SocketAddr,
}

impl ControllerConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ControllerError::InvalidConfig(format!("{} environment variable is required", key))
                })
        };

        let netbird_url = required("NETBIRD_URL")?.trim_end_matches('/').to_string();
        let netbird_api_key = required("NETBIRD_API_KEY")?;
        let namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty());

        let metrics_addr = lookup("METRICS_ADDR")
            .unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string());
        let metrics_addr = metrics_addr.parse::<SocketAddr>().map_err(|e| {
            ControllerError::InvalidConfig(format!("METRICS_ADDR '{}' is not a socket address: {}", metrics_addr, e))
        })?;

        Ok(Self {
            netbird_url,
            netbird_api_key,
            namespace,
            metrics_addr,
        })
    }

    /// Token with everything except the last 8 characters hidden
    pub fn redacted_api_key(&self) -> String {
        let chars: Vec<char> = self.netbird_api_key.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(8)..].iter().collect();
        format!("...{}", tail)
    }
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("netbird_url", &self.netbird_url)
            .field("netbird_api_key", &self.redacted_api_key())
            .field("namespace", &self.namespace)
            .field("metrics_addr", &self.metrics_addr)
            .finish()
    }
}
