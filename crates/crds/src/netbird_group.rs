//! NetbirdGroup Custom Resource Definition
//!
//! Defines a Kubernetes CRD for managing NetBird peer groups.

use crate::status::NetbirdStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// NetbirdGroupSpec defines the desired state of a NetBird group
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gitops.netbird.io",
    version = "v1alpha1",
    kind = "NetbirdGroup",
    plural = "groups",
    shortname = "nbgroup",
    namespaced,
    status = "NetbirdStatus",
    printcolumn = r#"{"name":"Name","type":"string","jsonPath":".spec.name"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status"}"#,
    printcolumn = r#"{"name":"Reason","type":"string","jsonPath":".status.reason"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct NetbirdGroupSpec {
    /// Group name in NetBird
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Peer IDs. Leaving this unset is not the same as an empty list:
    /// unset peers are not sent to NetBird at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<String>>,
}
