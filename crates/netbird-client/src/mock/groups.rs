//! Group operations for MockNetbirdClient

use super::MockNetbirdClient;
use crate::common::Verb;
use crate::error::NetbirdError;
use crate::models::*;

fn to_group(id: String, request: &GroupRequest) -> Group {
    let peers: Vec<GroupPeer> = request
        .peers
        .iter()
        .flatten()
        .map(|peer| GroupPeer { id: peer.clone(), name: peer.clone() })
        .collect();
    Group {
        id: Some(id),
        name: request.name.clone(),
        peers_count: peers.len() as u64,
        peers,
    }
}

pub async fn create_group(client: &MockNetbirdClient, request: &GroupRequest) -> Result<Group, NetbirdError> {
    client.record(Verb::Post, "/groups".to_string(), Some(serde_json::to_value(request)?))?;
    let id = client.next_id("group");
    let group = to_group(id.clone(), request);
    client.groups.lock().unwrap().insert(id, group.clone());
    Ok(group)
}

pub async fn get_group(client: &MockNetbirdClient, id: &str) -> Result<Group, NetbirdError> {
    let path = format!("/groups/{}", id);
    client.record(Verb::Get, path.clone(), None)?;
    client.groups
        .lock()
        .unwrap()
        .get(id)
        .cloned()
        .ok_or_else(|| NetbirdError::NotFound(format!("GET {}", path)))
}

pub async fn put_group(client: &MockNetbirdClient, id: &str, request: &GroupRequest) -> Result<Group, NetbirdError> {
    let path = format!("/groups/{}", id);
    client.record(Verb::Put, path.clone(), Some(serde_json::to_value(request)?))?;
    let mut groups = client.groups.lock().unwrap();
    if !groups.contains_key(id) {
        return Err(NetbirdError::NotFound(format!("PUT {}", path)));
    }
    let group = to_group(id.to_string(), request);
    groups.insert(id.to_string(), group.clone());
    Ok(group)
}

pub async fn delete_group(client: &MockNetbirdClient, id: &str) -> Result<Deletion, NetbirdError> {
    client.record(Verb::Delete, format!("/groups/{}", id), None)?;
    match client.groups.lock().unwrap().remove(id) {
        Some(_) => Ok(Deletion::Deleted),
        None => Ok(Deletion::AlreadyAbsent),
    }
}
