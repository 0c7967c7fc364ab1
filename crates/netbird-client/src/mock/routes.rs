//! Route operations for MockNetbirdClient

use super::MockNetbirdClient;
use crate::common::Verb;
use crate::error::NetbirdError;
use crate::models::*;

fn to_route(id: String, request: &RouteRequest) -> Route {
    Route {
        id: Some(id),
        network_type: Some(if request.network.contains(':') { "IPv6" } else { "IPv4" }.to_string()),
        description: request.description.clone(),
        network: request.network.clone(),
        network_id: request.network_id.clone(),
        peer: request.peer.clone(),
        groups: request.groups.clone(),
        enabled: request.enabled,
        masquerade: request.masquerade,
        metric: request.metric,
    }
}

pub async fn create_route(client: &MockNetbirdClient, request: &RouteRequest) -> Result<Route, NetbirdError> {
    client.record(Verb::Post, "/routes".to_string(), Some(serde_json::to_value(request)?))?;
    let id = client.next_id("route");
    let route = to_route(id.clone(), request);
    client.routes.lock().unwrap().insert(id, route.clone());
    Ok(route)
}

pub async fn get_route(client: &MockNetbirdClient, id: &str) -> Result<Route, NetbirdError> {
    let path = format!("/routes/{}", id);
    client.record(Verb::Get, path.clone(), None)?;
    client.routes
        .lock()
        .unwrap()
        .get(id)
        .cloned()
        .ok_or_else(|| NetbirdError::NotFound(format!("GET {}", path)))
}

pub async fn put_route(client: &MockNetbirdClient, id: &str, request: &RouteRequest) -> Result<Route, NetbirdError> {
    let path = format!("/routes/{}", id);
    client.record(Verb::Put, path.clone(), Some(serde_json::to_value(request)?))?;
    let mut routes = client.routes.lock().unwrap();
    if !routes.contains_key(id) {
        return Err(NetbirdError::NotFound(format!("PUT {}", path)));
    }
    let route = to_route(id.to_string(), request);
    routes.insert(id.to_string(), route.clone());
    Ok(route)
}

pub async fn delete_route(client: &MockNetbirdClient, id: &str) -> Result<Deletion, NetbirdError> {
    client.record(Verb::Delete, format!("/routes/{}", id), None)?;
    match client.routes.lock().unwrap().remove(id) {
        Some(_) => Ok(Deletion::Deleted),
        None => Ok(Deletion::AlreadyAbsent),
    }
}
