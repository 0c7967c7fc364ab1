//! Integration tests for the NetBird client
//!
//! These tests require a reachable NetBird management API.
//! Set NETBIRD_URL and NETBIRD_API_KEY environment variables to run.

use netbird_client::{Deletion, GroupRequest, NetbirdClient, NetbirdClientTrait, NetbirdError};

fn client() -> NetbirdClient {
    let url = std::env::var("NETBIRD_URL")
        .unwrap_or_else(|_| "http://localhost:33073/api".to_string());
    let token = std::env::var("NETBIRD_API_KEY")
        .expect("NETBIRD_API_KEY environment variable must be set");

    NetbirdClient::new(url, token).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running NetBird management API
async fn test_validate_token() {
    let result = client().validate_token().await;
    assert!(result.is_ok(), "Failed to validate token: {:?}", result.err());
}

#[tokio::test]
#[ignore]
async fn test_group_lifecycle() {
    let client = client();

    let request = GroupRequest {
        name: "netbird-client-integration".to_string(),
        description: "created by integration test".to_string(),
        peers: None,
        id: None,
    };
    let group = client.create_group(&request).await.expect("Failed to create group");
    let id = group.id.expect("server must assign an id");

    let renamed = GroupRequest {
        name: "netbird-client-integration-renamed".to_string(),
        ..request
    };
    let updated = client.update_group(&id, &renamed).await.expect("Failed to update group");
    assert_eq!(updated.name, "netbird-client-integration-renamed");

    assert_eq!(client.delete_group(&id).await.unwrap(), Deletion::Deleted);
    // Deleting again is idempotent
    assert_eq!(client.delete_group(&id).await.unwrap(), Deletion::AlreadyAbsent);
}

#[tokio::test]
#[ignore]
async fn test_get_unknown_route_is_not_found() {
    let err = client().get_route("does-not-exist").await.unwrap_err();
    assert!(matches!(err, NetbirdError::NotFound(_)), "unexpected error: {:?}", err);
}
