//! Unit tests for the NetbirdGroup reconciler

#[cfg(test)]
mod tests {
    use crate::reconciler::{LifecycleHandler, Outcome};
    use crate::test_utils::*;
    use netbird_client::{NetbirdError, Verb};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_group_omits_undeclared_peers() {
        let mock = create_mock_client();
        let reconciler = create_group_reconciler(&mock);

        let spec = group_spec();
        let result = reconciler.on_create(event(&spec, None)).await;

        assert_eq!(result.outcome, Outcome::Converged);
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].verb, Verb::Post);
        assert_eq!(requests[0].path, "/groups");
        assert_eq!(requests[0].body, Some(json!({"name": "ops", "description": "operators"})));

        let status = result.status.unwrap();
        assert_eq!(status.external_id.as_deref(), Some("group-1"));
        assert_eq!(status.reason.as_deref(), Some("GroupCreated"));
        assert!(mock.group("group-1").is_some());
    }

    #[tokio::test]
    async fn test_create_group_sends_empty_peer_list() {
        let mock = create_mock_client();
        let reconciler = create_group_reconciler(&mock);

        let spec = json!({"name": "empty", "peers": []});
        reconciler.on_create(event(&spec, None)).await;

        assert_eq!(mock.requests()[0].body.as_ref().unwrap()["peers"], json!([]));
    }

    #[tokio::test]
    async fn test_create_group_without_name() {
        let mock = create_mock_client();
        let reconciler = create_group_reconciler(&mock);

        let spec = json!({"description": "nameless"});
        let result = reconciler.on_create(event(&spec, None)).await;

        assert_eq!(mock.request_count(), 0);
        assert!(matches!(result.outcome, Outcome::Permanent { ref reason, .. } if reason == "ValidationError"));
    }

    #[tokio::test]
    async fn test_update_group_reads_then_writes() {
        let mock = create_mock_client();
        mock.add_group(stored_group("g1"));
        let reconciler = create_group_reconciler(&mock);
        let prior = synced_status("GroupCreated", "g1");

        let old = group_spec();
        let new = json!({"name": "ops", "description": "operators", "peers": ["p1", "p2"]});
        let result = reconciler.on_update(&old, event(&new, Some(&prior))).await;

        assert_eq!(result.outcome, Outcome::Converged);
        let requests = mock.requests();
        assert_eq!((requests[0].verb, requests[0].path.as_str()), (Verb::Get, "/groups/g1"));
        assert_eq!((requests[1].verb, requests[1].path.as_str()), (Verb::Put, "/groups/g1"));
        assert_eq!(requests[1].body.as_ref().unwrap()["id"], "g1");
        assert_eq!(result.status.unwrap().reason.as_deref(), Some("GroupUpdated"));
        assert_eq!(mock.group("g1").unwrap().peers_count, 2);
    }

    #[tokio::test]
    async fn test_create_group_with_legacy_id_applies_declared_state() {
        let mock = create_mock_client();
        mock.add_group(stored_group("g9"));
        let reconciler = create_group_reconciler(&mock);
        let prior = legacy_status("create_group_fn", "g9");

        let spec = json!({"name": "ops", "peers": ["p1"]});
        let result = reconciler.on_create(event(&spec, Some(&prior))).await;

        assert_eq!(result.outcome, Outcome::Converged);
        let requests = mock.requests();
        assert!(requests.iter().all(|r| r.verb != Verb::Post));
        assert_eq!((requests[1].verb, requests[1].path.as_str()), (Verb::Put, "/groups/g9"));
        assert_eq!(mock.group("g9").unwrap().peers_count, 1);

        let status = result.status.unwrap();
        assert_eq!(status.reason.as_deref(), Some("GroupCreated"));
        assert_eq!(status.external_id.as_deref(), Some("g9"));
    }

    #[tokio::test]
    async fn test_update_group_unchanged() {
        let mock = create_mock_client();
        let reconciler = create_group_reconciler(&mock);
        let prior = synced_status("GroupCreated", "g1");

        let spec = group_spec();
        let result = reconciler.on_update(&spec, event(&spec, Some(&prior))).await;

        assert_eq!(result.outcome, Outcome::Unchanged);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_group_with_legacy_identifier() {
        let mock = create_mock_client();
        mock.add_group(stored_group("g7"));
        let reconciler = create_group_reconciler(&mock);
        let prior = legacy_status("create_group_fn", "g7");

        let spec = group_spec();
        let result = reconciler.on_delete(event(&spec, Some(&prior))).await;

        assert_eq!(result.outcome, Outcome::Converged);
        assert_eq!(mock.requests()[0].path, "/groups/g7");
        assert!(mock.group("g7").is_none());
        assert_eq!(result.status.unwrap().reason.as_deref(), Some("GroupDeleted"));
    }

    #[tokio::test]
    async fn test_delete_missing_group_succeeds() {
        let mock = create_mock_client();
        let reconciler = create_group_reconciler(&mock);
        let prior = synced_status("GroupCreated", "gone");

        let spec = group_spec();
        let result = reconciler.on_delete(event(&spec, Some(&prior))).await;

        assert_eq!(result.outcome, Outcome::Converged);
    }

    #[tokio::test]
    async fn test_delete_group_transport_error_is_permanent() {
        let mock = create_mock_client();
        mock.fail_next(NetbirdError::Api { status: 502, body: "bad gateway".to_string() });
        let reconciler = create_group_reconciler(&mock);
        let prior = synced_status("GroupCreated", "g1");

        let spec = group_spec();
        let result = reconciler.on_delete(event(&spec, Some(&prior))).await;

        match result.outcome {
            Outcome::Permanent { message, .. } => assert!(message.contains("bad gateway")),
            other => panic!("expected permanent failure, got {:?}", other),
        }
    }
}
