//! NetBird GitOps CRD Definitions
//!
//! Kubernetes Custom Resource Definitions reconciled by the NetBird controller.

pub mod netbird_group;
pub mod network_route;
pub mod status;

pub use netbird_group::*;
pub use network_route::*;
pub use status::*;

/// API group shared by all NetBird GitOps resources
pub const API_GROUP: &str = "gitops.netbird.io";
