//! NetworkRoute reconciler

use super::{Reconciler, ResourceKind};
use crate::error::ReconcileError;
use crate::spec::RouteSpec;
use netbird_client::{Deletion, NetbirdClientTrait, NetbirdError};
use serde_json::Value;

/// NetworkRoute <-> NetBird route
#[derive(Debug, Clone, Copy)]
pub struct RouteKind;

/// Reconciler for NetworkRoute resources
pub type RouteReconciler = Reconciler<RouteKind>;

#[async_trait::async_trait]
impl ResourceKind for RouteKind {
    type Spec = RouteSpec;

    const KIND: &'static str = "route";
    const TITLE: &'static str = "Route";
    const CREATED: &'static str = "RouteCreated";
    const UPDATED: &'static str = "RouteUpdated";
    const DELETED: &'static str = "RouteDeleted";

    fn parse(raw: &Value) -> Result<RouteSpec, ReconcileError> {
        RouteSpec::parse(raw)
    }

    fn with_external_id(spec: RouteSpec, id: &str) -> RouteSpec {
        spec.with_external_id(id)
    }

    async fn create(client: &dyn NetbirdClientTrait, spec: &RouteSpec) -> Result<Option<String>, NetbirdError> {
        let mut request = spec.to_request();
        request.id = None;
        Ok(client.create_route(&request).await?.id)
    }

    async fn update(client: &dyn NetbirdClientTrait, id: &str, spec: &RouteSpec) -> Result<Option<String>, NetbirdError> {
        Ok(client.update_route(id, &spec.to_request()).await?.id)
    }

    async fn delete(client: &dyn NetbirdClientTrait, id: &str) -> Result<Deletion, NetbirdError> {
        client.delete_route(id).await
    }
}
