//! Shared status sub-resource for NetBird GitOps resources
//!
//! Both `NetworkRoute` and `NetbirdGroup` report the same status shape. Status
//! written by earlier controller versions nested the NetBird identifier under
//! per-handler keys (`create_fn`, `update_fn`, ...); those keys are kept in
//! `legacy` so the identifier can still be recovered from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Condition type reported by the controller
pub const READY_CONDITION: &str = "Ready";

/// Maximum number of conditions kept in status history
pub const MAX_CONDITIONS: usize = 10;

/// NetbirdStatus defines the observed state of a NetBird resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(extend("x-kubernetes-preserve-unknown-fields" = true))]
pub struct NetbirdStatus {
    /// Condition history, oldest first
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Time of the last reconciliation attempt (RFC3339, UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,

    /// Mirror of the latest condition status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Mirror of the latest condition reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// NetBird identifier of the remote object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Generation of the resource last processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Keys written by older controller versions
    #[serde(flatten)]
    #[schemars(skip)]
    pub legacy: BTreeMap<String, Value>,
}

impl NetbirdStatus {
    /// Latest condition of the given type, if any
    pub fn latest_condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().rev().find(|c| c.type_ == type_)
    }
}

/// Kubernetes-style condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (always "Ready" for this controller)
    #[serde(rename = "type")]
    pub type_: String,

    pub status: ConditionStatus,

    /// Machine-readable reason tag (e.g., "RouteCreated")
    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub message: String,

    /// RFC3339 timestamp of when this entry was recorded
    #[serde(default)]
    pub last_transition_time: String,
}

/// Condition status following Kubernetes conventions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(ready: bool) -> Self {
        if ready { Self::True } else { Self::False }
    }
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
