//! Mock NetbirdClient for unit testing
//!
//! This module provides a mock implementation of NetbirdClientTrait that can be used
//! in unit tests without requiring a running NetBird management server.
//!
//! The mock is organized by resource:
//! - `routes.rs` - route operations
//! - `groups.rs` - group operations
//!
//! Every call is recorded in a journal so tests can assert which requests
//! were (or were not) sent, and failures can be injected one call at a time.

mod groups;
mod routes;

use crate::common::Verb;
use crate::error::NetbirdError;
use crate::models::*;
use crate::netbird_trait::NetbirdClientTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A request observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub verb: Verb,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

/// Mock NetbirdClient for testing
///
/// Stores routes and groups in memory. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MockNetbirdClient {
    pub(crate) base_url: String,
    pub(crate) routes: Arc<Mutex<HashMap<String, Route>>>,
    pub(crate) groups: Arc<Mutex<HashMap<String, Group>>>,
    pub(crate) journal: Arc<Mutex<Vec<RecordedRequest>>>,
    pub(crate) failures: Arc<Mutex<VecDeque<NetbirdError>>>,
    pub(crate) queued_ids: Arc<Mutex<VecDeque<String>>>,
    pub(crate) next_id: Arc<Mutex<u64>>,
}

impl MockNetbirdClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            routes: Arc::new(Mutex::new(HashMap::new())),
            groups: Arc::new(Mutex::new(HashMap::new())),
            journal: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            queued_ids: Arc::new(Mutex::new(VecDeque::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Add a route to the mock store (for test setup)
    pub fn add_route(&self, route: Route) {
        let id = route.id.clone().unwrap_or_default();
        self.routes.lock().unwrap().insert(id, route);
    }

    /// Add a group to the mock store (for test setup)
    pub fn add_group(&self, group: Group) {
        let id = group.id.clone().unwrap_or_default();
        self.groups.lock().unwrap().insert(id, group);
    }

    /// Look up a stored route
    pub fn route(&self, id: &str) -> Option<Route> {
        self.routes.lock().unwrap().get(id).cloned()
    }

    /// Look up a stored group
    pub fn group(&self, id: &str) -> Option<Group> {
        self.groups.lock().unwrap().get(id).cloned()
    }

    /// Make the next call fail with `error` (calls are still journaled)
    pub fn fail_next(&self, error: NetbirdError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Hand out `id` for the next created object instead of a generated one
    pub fn queue_id(&self, id: impl Into<String>) {
        self.queued_ids.lock().unwrap().push_back(id.into());
    }

    /// All requests seen so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.journal.lock().unwrap().clone()
    }

    /// Number of requests seen so far
    pub fn request_count(&self) -> usize {
        self.journal.lock().unwrap().len()
    }

    /// Journal a request and return the injected failure, if any
    pub(crate) fn record(
        &self,
        verb: Verb,
        path: String,
        body: Option<serde_json::Value>,
    ) -> Result<(), NetbirdError> {
        self.journal.lock().unwrap().push(RecordedRequest { verb, path, body });
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Generate next ID
    pub(crate) fn next_id(&self, kind: &str) -> String {
        if let Some(id) = self.queued_ids.lock().unwrap().pop_front() {
            return id;
        }
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        format!("{}-{}", kind, current)
    }
}

#[async_trait::async_trait]
impl NetbirdClientTrait for MockNetbirdClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_token(&self) -> Result<(), NetbirdError> {
        Ok(())
    }

    async fn create_route(&self, request: &RouteRequest) -> Result<Route, NetbirdError> {
        routes::create_route(self, request).await
    }

    async fn get_route(&self, id: &str) -> Result<Route, NetbirdError> {
        routes::get_route(self, id).await
    }

    async fn put_route(&self, id: &str, request: &RouteRequest) -> Result<Route, NetbirdError> {
        routes::put_route(self, id, request).await
    }

    async fn delete_route(&self, id: &str) -> Result<Deletion, NetbirdError> {
        routes::delete_route(self, id).await
    }

    async fn create_group(&self, request: &GroupRequest) -> Result<Group, NetbirdError> {
        groups::create_group(self, request).await
    }

    async fn get_group(&self, id: &str) -> Result<Group, NetbirdError> {
        groups::get_group(self, id).await
    }

    async fn put_group(&self, id: &str, request: &GroupRequest) -> Result<Group, NetbirdError> {
        groups::put_group(self, id, request).await
    }

    async fn delete_group(&self, id: &str) -> Result<Deletion, NetbirdError> {
        groups::delete_group(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RouteRequest {
        RouteRequest {
            description: "lan".to_string(),
            network: "192.168.1.0/24".to_string(),
            peer: "p1".to_string(),
            groups: vec!["g1".to_string()],
            network_id: "net1".to_string(),
            enabled: true,
            masquerade: false,
            metric: 9999,
            id: None,
        }
    }

    #[tokio::test]
    async fn test_update_route_reads_then_writes() {
        let mock = MockNetbirdClient::new("http://test-netbird");
        let created = mock.create_route(&request()).await.unwrap();
        let id = created.id.unwrap();

        let mut changed = request();
        changed.metric = 10;
        let updated = mock.update_route(&id, &changed).await.unwrap();
        assert_eq!(updated.metric, 10);

        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].verb, Verb::Get);
        assert_eq!(requests[2].verb, Verb::Put);
        assert_eq!(requests[2].body.as_ref().unwrap()["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_update_missing_route_is_not_found() {
        let mock = MockNetbirdClient::new("http://test-netbird");
        let err = mock.update_route("gone", &request()).await.unwrap_err();
        assert!(matches!(err, NetbirdError::NotFound(_)));
        // Only the read happened
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_route_is_already_absent() {
        let mock = MockNetbirdClient::new("http://test-netbird");
        assert_eq!(mock.delete_route("gone").await.unwrap(), Deletion::AlreadyAbsent);
    }

    #[tokio::test]
    async fn test_injected_failure_is_returned_once() {
        let mock = MockNetbirdClient::new("http://test-netbird");
        mock.fail_next(NetbirdError::Api { status: 503, body: "maintenance".to_string() });
        assert!(mock.create_route(&request()).await.is_err());
        assert!(mock.create_route(&request()).await.is_ok());
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_queued_id_is_used_first() {
        let mock = MockNetbirdClient::new("http://test-netbird");
        mock.queue_id("r1");
        let first = mock.create_route(&request()).await.unwrap();
        let second = mock.create_route(&request()).await.unwrap();
        assert_eq!(first.id.as_deref(), Some("r1"));
        assert_eq!(second.id.as_deref(), Some("route-1"));
    }
}
