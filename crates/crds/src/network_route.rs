//! NetworkRoute Custom Resource Definition
//!
//! Defines a Kubernetes CRD for managing NetBird network routes.
//!
//! Fields are deliberately loose (all optional): the controller validates the
//! declared spec itself so that a malformed route is reported through status
//! conditions instead of being dropped by deserialization.

use crate::status::NetbirdStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// NetworkRouteSpec defines the desired state of a NetBird route
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gitops.netbird.io",
    version = "v1alpha1",
    kind = "NetworkRoute",
    plural = "networkroutes",
    shortname = "nbroute",
    namespaced,
    status = "NetbirdStatus",
    printcolumn = r#"{"name":"Network","type":"string","jsonPath":".spec.network"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Reason","type":"string","jsonPath":".status.reason"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRouteSpec {
    /// Routed network in CIDR notation (e.g., "192.168.1.0/24")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Routing peer ID (preferred over `peer`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<String>,

    /// Routing peer ID, older field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,

    /// Distribution group IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,

    /// Network identifier shown in the NetBird dashboard
    #[serde(rename = "network_id", alias = "networkId", skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Defaults to true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Defaults to false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<bool>,

    /// Route metric, lower wins (defaults to 9999)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<i64>,
}
