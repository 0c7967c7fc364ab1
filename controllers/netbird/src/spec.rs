//! Declared-spec validation
//!
//! Turns the raw spec mapping of a custom resource into a typed, normalized
//! `RouteSpec` or `GroupSpec`. Parsing is pure: nothing here touches the
//! network, and every failure is a `ReconcileError::Validation`.
//!
//! The parser works on `serde_json::Value` rather than the typed CRD spec so
//! that the same rules apply to specs recovered from the last-handled
//! annotation and to NetBird wire bodies.

use crate::error::ReconcileError;
use ipnetwork::IpNetwork;
use netbird_client::{GroupRequest, RouteRequest};
use serde_json::{Map, Value};

/// Metric applied when the spec does not set one
pub const DEFAULT_METRIC: u64 = 9999;

/// A validated NetBird route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSpec {
    pub network: IpNetwork,
    pub peer: String,
    pub groups: Vec<String>,
    pub network_id: String,
    pub description: String,
    pub enabled: bool,
    pub masquerade: bool,
    pub metric: u64,
    pub external_id: Option<String>,
}

/// A validated NetBird group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: String,
    pub description: String,
    /// `None` when peers were not declared (distinct from an empty list)
    pub peers: Option<Vec<String>>,
    pub external_id: Option<String>,
}

fn invalid(msg: impl Into<String>) -> ReconcileError {
    ReconcileError::Validation(msg.into())
}

fn as_mapping(raw: &Value) -> Result<&Map<String, Value>, ReconcileError> {
    raw.as_object()
        .ok_or_else(|| invalid(format!("spec must be a mapping, got {}", raw)))
}

/// Optional string field; `null` counts as absent
fn optional_str(data: &Map<String, Value>, key: &str) -> Result<Option<String>, ReconcileError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid(format!("{} must be a string, got {}", key, other))),
    }
}

/// First non-empty string among `keys`
fn first_non_empty(data: &Map<String, Value>, keys: &[&str]) -> Result<Option<String>, ReconcileError> {
    for key in keys {
        if let Some(value) = optional_str(data, key)? {
            if !value.is_empty() {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}

fn optional_bool(data: &Map<String, Value>, key: &str, default: bool) -> Result<bool, ReconcileError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(invalid(format!("{} must be a boolean, got {}", key, other))),
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>, ReconcileError> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid(format!("{} must be a list, got {}", key, value)))?;
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(invalid(format!("{} entries must be strings, got {}", key, other))),
        })
        .collect()
}

/// Parse a CIDR literal, rejecting prefix lengths out of range and host bits set
fn parse_network(network: &str) -> Result<IpNetwork, ReconcileError> {
    let parsed: IpNetwork = network
        .parse()
        .map_err(|e| invalid(format!("Invalid network format: {}. Error: {}", network, e)))?;
    if parsed.ip() != parsed.network() {
        return Err(invalid(format!(
            "Invalid network format: {}. Error: {} has host bits set",
            network, network
        )));
    }
    Ok(parsed)
}

/// Route metric, `DEFAULT_METRIC` when absent.
///
/// NetBird stores the metric as an integer, so only whole non-negative
/// numbers are accepted: `10` and `10.0` pass, `1.5` and `-1` are
/// validation errors. The CRD schema already declares `metric` as an
/// integer; this check covers specs that reach the controller unvalidated.
fn parse_metric(data: &Map<String, Value>) -> Result<u64, ReconcileError> {
    let value = match data.get("metric") {
        None | Some(Value::Null) => return Ok(DEFAULT_METRIC),
        Some(value) => value,
    };
    let reject = || invalid(format!("Invalid metric value: {}. Must be a positive number.", value));

    if let Some(metric) = value.as_u64() {
        return Ok(metric);
    }
    match value.as_f64() {
        // Integral floats such as 10.0 are accepted
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(reject()),
    }
}

impl RouteSpec {
    /// Validate a raw route mapping
    pub fn parse(raw: &Value) -> Result<Self, ReconcileError> {
        let data = as_mapping(raw)?;

        let peer = first_non_empty(data, &["peerId", "peer"])?
            .ok_or_else(|| invalid("peerId is required"))?;

        let network = first_non_empty(data, &["network"])?
            .ok_or_else(|| invalid("network is required"))?;
        let network = parse_network(&network)?;

        let groups = match data.get("groups") {
            None | Some(Value::Null) => return Err(invalid("groups is required and must be a list")),
            Some(value) => string_list("groups", value)?,
        };
        if groups.is_empty() {
            return Err(invalid("groups is required and must be a list"));
        }

        let network_id = first_non_empty(data, &["network_id", "networkId"])?
            .ok_or_else(|| invalid("network_id is required"))?;

        Ok(Self {
            network,
            peer,
            groups,
            network_id,
            description: optional_str(data, "description")?.unwrap_or_default(),
            enabled: optional_bool(data, "enabled", true)?,
            masquerade: optional_bool(data, "masquerade", false)?,
            metric: parse_metric(data)?,
            external_id: first_non_empty(data, &["id", "externalId"])?,
        })
    }

    /// Attach the NetBird identifier before an update
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    /// Wire body for NetBird
    pub fn to_request(&self) -> RouteRequest {
        RouteRequest {
            description: self.description.clone(),
            network: self.network.to_string(),
            peer: self.peer.clone(),
            groups: self.groups.clone(),
            network_id: self.network_id.clone(),
            enabled: self.enabled,
            masquerade: self.masquerade,
            metric: self.metric,
            id: self.external_id.clone(),
        }
    }
}

impl GroupSpec {
    /// Validate a raw group mapping
    pub fn parse(raw: &Value) -> Result<Self, ReconcileError> {
        let data = as_mapping(raw)?;

        let name = first_non_empty(data, &["name"])?.ok_or_else(|| invalid("name is required"))?;

        let peers = match data.get("peers") {
            None | Some(Value::Null) => None,
            Some(value @ Value::Array(_)) => Some(string_list("peers", value)?),
            Some(_) => return Err(invalid("if peers is provided, it must be a list")),
        };

        Ok(Self {
            name,
            description: optional_str(data, "description")?.unwrap_or_default(),
            peers,
            external_id: first_non_empty(data, &["id", "externalId"])?,
        })
    }

    /// Attach the NetBird identifier before an update
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    /// Wire body for NetBird
    pub fn to_request(&self) -> GroupRequest {
        GroupRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            peers: self.peers.clone(),
            id: self.external_id.clone(),
        }
    }
}
