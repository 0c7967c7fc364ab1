//! Test utilities for unit testing reconcilers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::reconciler::{GroupReconciler, ResourceEvent, RouteReconciler};
use crate::status::build_status;
use crds::NetbirdStatus;
use netbird_client::{Group, MockNetbirdClient, Route};
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_KEY: &str = "default/test";

/// Helper to create a mock NetBird client
pub fn create_mock_client() -> MockNetbirdClient {
    MockNetbirdClient::new("http://test-netbird/api")
}

/// Route reconciler sharing state with `mock`
pub fn create_route_reconciler(mock: &MockNetbirdClient) -> RouteReconciler {
    RouteReconciler::new(Arc::new(mock.clone()))
}

/// Group reconciler sharing state with `mock`
pub fn create_group_reconciler(mock: &MockNetbirdClient) -> GroupReconciler {
    GroupReconciler::new(Arc::new(mock.clone()))
}

/// Minimal valid NetworkRoute spec
pub fn route_spec() -> Value {
    json!({
        "network": "192.168.1.0/24",
        "peerId": "p1",
        "groups": ["g1"],
        "network_id": "net1"
    })
}

/// Minimal valid NetbirdGroup spec
pub fn group_spec() -> Value {
    json!({"name": "ops", "description": "operators"})
}

/// Status as left by a successful create
pub fn synced_status(reason: &str, id: &str) -> NetbirdStatus {
    build_status(true, reason, "created", Some(id.to_string()), Some(1))
}

/// Status written by older, handler-keyed controller versions
pub fn legacy_status(handler: &str, id: &str) -> NetbirdStatus {
    serde_json::from_value(json!({
        handler: {"resourceID": id},
        "lastSync": "2024-01-01T00:00:00Z"
    }))
    .expect("legacy status")
}

pub fn event<'a>(spec: &'a Value, status: Option<&'a NetbirdStatus>) -> ResourceEvent<'a> {
    ResourceEvent {
        key: TEST_KEY,
        spec,
        status,
        generation: Some(2),
    }
}

/// Route stored in NetBird matching `route_spec()`
pub fn stored_route(id: &str) -> Route {
    Route {
        id: Some(id.to_string()),
        network_type: Some("IPv4".to_string()),
        network: "192.168.1.0/24".to_string(),
        network_id: "net1".to_string(),
        peer: "p1".to_string(),
        groups: vec!["g1".to_string()],
        enabled: true,
        metric: 9999,
        ..Default::default()
    }
}

pub fn stored_group(id: &str) -> Group {
    Group {
        id: Some(id.to_string()),
        name: "ops".to_string(),
        ..Default::default()
    }
}
