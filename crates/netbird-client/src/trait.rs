//! NetbirdClient trait for mocking
//!
//! This trait abstracts the NetbirdClient to enable mocking in unit tests.
//! The concrete NetbirdClient implements this trait, and tests can use mock implementations.

use crate::error::NetbirdError;
use crate::models::*;
use tracing::debug;

/// Trait for NetBird API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
/// `update_route` and `update_group` are provided: they read the current
/// object first and then write with the identifier the server reported, so
/// every implementation follows the same read-then-write rule.
#[async_trait::async_trait]
pub trait NetbirdClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Validate the API token with a lightweight authenticated request
    async fn validate_token(&self) -> Result<(), NetbirdError>;

    // Routes
    async fn create_route(&self, request: &RouteRequest) -> Result<Route, NetbirdError>;
    async fn get_route(&self, id: &str) -> Result<Route, NetbirdError>;
    async fn put_route(&self, id: &str, request: &RouteRequest) -> Result<Route, NetbirdError>;
    async fn delete_route(&self, id: &str) -> Result<Deletion, NetbirdError>;

    // Groups
    async fn create_group(&self, request: &GroupRequest) -> Result<Group, NetbirdError>;
    async fn get_group(&self, id: &str) -> Result<Group, NetbirdError>;
    async fn put_group(&self, id: &str, request: &GroupRequest) -> Result<Group, NetbirdError>;
    async fn delete_group(&self, id: &str) -> Result<Deletion, NetbirdError>;

    /// Update an existing route
    ///
    /// Fetches the route first so a stale or recycled identifier surfaces as
    /// an error instead of addressing the wrong object.
    async fn update_route(&self, id: &str, request: &RouteRequest) -> Result<Route, NetbirdError> {
        let existing = self.get_route(id).await?;
        debug!("Existing route: {:?}", existing);
        let canonical_id = existing.id.unwrap_or_else(|| id.to_string());
        let request = RouteRequest {
            id: Some(canonical_id.clone()),
            ..request.clone()
        };
        self.put_route(&canonical_id, &request).await
    }

    /// Update an existing group, read-then-write like [`Self::update_route`]
    async fn update_group(&self, id: &str, request: &GroupRequest) -> Result<Group, NetbirdError> {
        let existing = self.get_group(id).await?;
        debug!("Existing group: {:?}", existing);
        let canonical_id = existing.id.unwrap_or_else(|| id.to_string());
        let request = GroupRequest {
            id: Some(canonical_id.clone()),
            ..request.clone()
        };
        self.put_group(&canonical_id, &request).await
    }
}
