//! NetbirdGroup reconciler

use super::{Reconciler, ResourceKind};
use crate::error::ReconcileError;
use crate::spec::GroupSpec;
use netbird_client::{Deletion, NetbirdClientTrait, NetbirdError};
use serde_json::Value;

/// NetbirdGroup <-> NetBird group
#[derive(Debug, Clone, Copy)]
pub struct GroupKind;

/// Reconciler for NetbirdGroup resources
pub type GroupReconciler = Reconciler<GroupKind>;

#[async_trait::async_trait]
impl ResourceKind for GroupKind {
    type Spec = GroupSpec;

    const KIND: &'static str = "group";
    const TITLE: &'static str = "Group";
    const CREATED: &'static str = "GroupCreated";
    const UPDATED: &'static str = "GroupUpdated";
    const DELETED: &'static str = "GroupDeleted";

    fn parse(raw: &Value) -> Result<GroupSpec, ReconcileError> {
        GroupSpec::parse(raw)
    }

    fn with_external_id(spec: GroupSpec, id: &str) -> GroupSpec {
        spec.with_external_id(id)
    }

    async fn create(client: &dyn NetbirdClientTrait, spec: &GroupSpec) -> Result<Option<String>, NetbirdError> {
        let mut request = spec.to_request();
        request.id = None;
        Ok(client.create_group(&request).await?.id)
    }

    async fn update(client: &dyn NetbirdClientTrait, id: &str, spec: &GroupSpec) -> Result<Option<String>, NetbirdError> {
        Ok(client.update_group(id, &spec.to_request()).await?.id)
    }

    async fn delete(client: &dyn NetbirdClientTrait, id: &str) -> Result<Deletion, NetbirdError> {
        client.delete_group(id).await
    }
}
