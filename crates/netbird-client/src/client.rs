//! NetBird API client
//!
//! Implements the NetBird management REST API client for routes and groups.
//! Endpoints are relative to the configured base URL, e.g.
//! `https://api.netbird.io/api` + `/routes`.

use crate::common::HttpClient;
use crate::error::NetbirdError;
use crate::models::*;
use crate::netbird_trait::NetbirdClientTrait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// NetBird API client
#[derive(Debug)]
pub struct NetbirdClient {
    http: HttpClient,
}

impl NetbirdClient {
    /// Create a new NetBird client
    ///
    /// # Arguments
    /// * `base_url` - NetBird API base URL (e.g., "https://api.netbird.io/api")
    /// * `token` - API token, sent as a bearer token
    pub fn new(base_url: String, token: String) -> Result<Self, NetbirdError> {
        if base_url.trim().is_empty() {
            return Err(NetbirdError::InvalidConfig("NetBird base URL is empty".to_string()));
        }
        if token.trim().is_empty() {
            return Err(NetbirdError::InvalidConfig("NetBird API token is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(NetbirdError::Http)?;

        Ok(Self {
            http: HttpClient::new(client, base_url, token),
        })
    }
}

#[async_trait::async_trait]
impl NetbirdClientTrait for NetbirdClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn validate_token(&self) -> Result<(), NetbirdError> {
        debug!("Validating NetBird token and connectivity");
        let _: serde_json::Value = self.http.get("/groups").await?;
        debug!("Token validated successfully");
        Ok(())
    }

    /// Create a new route
    async fn create_route(&self, request: &RouteRequest) -> Result<Route, NetbirdError> {
        info!("Creating route for network {}", request.network);
        self.http.post("/routes", request).await
    }

    /// Get route details
    async fn get_route(&self, id: &str) -> Result<Route, NetbirdError> {
        self.http.get(&format!("/routes/{}", id)).await
    }

    async fn put_route(&self, id: &str, request: &RouteRequest) -> Result<Route, NetbirdError> {
        info!("Updating route {} for network {}", id, request.network);
        self.http.put(&format!("/routes/{}", id), request).await
    }

    /// Delete a route
    async fn delete_route(&self, id: &str) -> Result<Deletion, NetbirdError> {
        info!("Deleting route {}", id);
        self.http.delete(&format!("/routes/{}", id)).await
    }

    /// Create a new group
    async fn create_group(&self, request: &GroupRequest) -> Result<Group, NetbirdError> {
        info!("Creating group {}", request.name);
        self.http.post("/groups", request).await
    }

    async fn get_group(&self, id: &str) -> Result<Group, NetbirdError> {
        self.http.get(&format!("/groups/{}", id)).await
    }

    async fn put_group(&self, id: &str, request: &GroupRequest) -> Result<Group, NetbirdError> {
        info!("Updating group {} ({})", id, request.name);
        self.http.put(&format!("/groups/{}", id), request).await
    }

    /// Delete a group
    async fn delete_group(&self, id: &str) -> Result<Deletion, NetbirdError> {
        info!("Deleting group {}", id);
        self.http.delete(&format!("/groups/{}", id)).await
    }
}
