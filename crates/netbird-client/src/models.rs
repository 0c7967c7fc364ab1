//! NetBird API models
//!
//! Request bodies are the exact wire payloads sent on create and update.
//! Response models are lenient: every field defaults so that an empty 2xx
//! body still decodes, and an explicit `null` (the API's encoding of an empty
//! list) decodes to the default as well.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as `T::default()`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Request body for `POST /routes` and `PUT /routes/{id}`
///
/// `id` is omitted on create (the server assigns it) and always present on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub description: String,
    pub network: String,
    pub peer: String,
    pub groups: Vec<String>,
    pub network_id: String,
    pub enabled: bool,
    pub masquerade: bool,
    pub metric: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Route as returned by the NetBird API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    pub id: Option<String>,
    pub network_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub peer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub groups: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub masquerade: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub metric: u64,
}

/// Request body for `POST /groups` and `PUT /groups/{id}`
///
/// `peers` is omitted entirely when the declared group does not list peers;
/// an empty list is a different payload and is sent as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRequest {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Group as returned by the NetBird API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub peers_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub peers: Vec<GroupPeer>,
}

/// Minimal peer reference embedded in a group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupPeer {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// Result of a delete call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// The remote object existed and was removed
    Deleted,
    /// The remote object was already gone (HTTP 404)
    AlreadyAbsent,
}
