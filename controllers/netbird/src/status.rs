//! Status tracking for NetBird resources
//!
//! Builds status bodies, keeps the bounded `Ready` condition history, and
//! recovers the NetBird identifier from whatever status shape a previous
//! controller version left behind.

use chrono::{SecondsFormat, Utc};
use crds::{Condition, ConditionStatus, NetbirdStatus, MAX_CONDITIONS, READY_CONDITION};
use serde_json::Value;

/// Where the NetBird identifier has been stored over time, newest first.
const EXTERNAL_ID_POINTERS: &[&str] = &[
    "/externalId",
    "/resourceId",
    "/resourceID",
    "/update_fn/resourceID",
    "/create_fn/resourceID",
    "/update_group_fn/resourceID",
    "/create_group_fn/resourceID",
];

/// Current time as RFC3339 UTC with second precision and a `Z` suffix
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Look up the NetBird identifier in a raw status document.
pub fn external_id_from_value(status: &Value) -> Option<String> {
    EXTERNAL_ID_POINTERS
        .iter()
        .filter_map(|pointer| status.pointer(pointer))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            // Older status occasionally stored numeric identifiers
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Look up the NetBird identifier in the previous status, if any.
pub fn extract_external_id(status: Option<&NetbirdStatus>) -> Option<String> {
    let status = status?;
    if let Some(id) = status.external_id.as_ref().filter(|id| !id.is_empty()) {
        return Some(id.clone());
    }
    let raw = serde_json::to_value(status).ok()?;
    external_id_from_value(&raw)
}

/// Fresh status body carrying a single `Ready` condition.
///
/// `generation` is only passed once the resource generation has actually been
/// processed successfully.
pub fn build_status(
    ready: bool,
    reason: &str,
    message: impl Into<String>,
    external_id: Option<String>,
    generation: Option<i64>,
) -> NetbirdStatus {
    let now = timestamp();
    let status = ConditionStatus::from(ready);
    NetbirdStatus {
        conditions: vec![Condition {
            type_: READY_CONDITION.to_string(),
            status,
            reason: reason.to_string(),
            message: message.into(),
            last_transition_time: now.clone(),
        }],
        last_sync: Some(now),
        status: Some(status.to_string()),
        reason: Some(reason.to_string()),
        external_id,
        observed_generation: generation,
        legacy: Default::default(),
    }
}

/// Fold a freshly built status into the existing one.
///
/// The new condition is appended only when its status or reason differs from
/// the latest condition of the same type, and history keeps the most recent
/// `MAX_CONDITIONS` entries. Identifier, generation and legacy keys fall back
/// to the existing values when the new status does not set them.
pub fn merge_condition(existing: Option<&NetbirdStatus>, new: NetbirdStatus) -> NetbirdStatus {
    let Some(existing) = existing else {
        return new;
    };

    let mut conditions = existing.conditions.clone();
    for condition in new.conditions {
        let duplicate = conditions
            .iter()
            .rev()
            .find(|c| c.type_ == condition.type_)
            .is_some_and(|latest| latest.status == condition.status && latest.reason == condition.reason);
        if !duplicate {
            conditions.push(condition);
        }
    }
    if conditions.len() > MAX_CONDITIONS {
        conditions.drain(..conditions.len() - MAX_CONDITIONS);
    }

    let mut legacy = existing.legacy.clone();
    legacy.extend(new.legacy);

    NetbirdStatus {
        conditions,
        last_sync: new.last_sync.or_else(|| existing.last_sync.clone()),
        status: new.status.or_else(|| existing.status.clone()),
        reason: new.reason.or_else(|| existing.reason.clone()),
        external_id: new.external_id.or_else(|| existing.external_id.clone()),
        observed_generation: new.observed_generation.or(existing.observed_generation),
        legacy,
    }
}
