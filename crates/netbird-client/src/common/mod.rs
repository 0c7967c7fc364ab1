//! Common utilities for the NetBird API client
//!
//! Request execution and the response classification policy shared by every
//! resource operation.

use crate::error::NetbirdError;
use crate::models::Deletion;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error};

/// HTTP verb of a NetBird API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Classify an HTTP response into a decoded body or a typed error.
///
/// - 2xx: the body as JSON, an empty body becomes `{}`
/// - 422: [`NetbirdError::Rejected`] with the body verbatim
/// - 404: [`NetbirdError::NotFound`] (delete callers turn this into success)
/// - anything else: [`NetbirdError::Api`]
pub fn classify_response(
    verb: Verb,
    path: &str,
    status: u16,
    body: &str,
) -> Result<serde_json::Value, NetbirdError> {
    match status {
        200..=299 => {
            if body.trim().is_empty() {
                Ok(serde_json::Value::Object(serde_json::Map::new()))
            } else {
                Ok(serde_json::from_str(body)?)
            }
        }
        422 => {
            let detail = if body.trim().is_empty() {
                "No error details available".to_string()
            } else {
                body.to_string()
            };
            Err(NetbirdError::Rejected(detail))
        }
        404 => Err(NetbirdError::NotFound(format!("{} {}", verb, path))),
        _ => Err(NetbirdError::Api {
            status,
            body: body.to_string(),
        }),
    }
}

/// HTTP client wrapper with bearer authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("token", &self.redacted_token())
            .finish()
    }
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from an API path
    pub fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Token suitable for logs: only the last 8 characters survive
    pub fn redacted_token(&self) -> String {
        let tail: String = self
            .token
            .chars()
            .rev()
            .take(8)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("Bearer ...{}", tail)
    }

    /// Execute a request and classify the response
    pub async fn send(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, NetbirdError> {
        let url = self.build_url(path);
        debug!("Making {} request to {} (Authorization: {})", verb, url, self.redacted_token());
        if let Some(body) = body {
            debug!("Request payload: {}", body);
        }

        let builder = match verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url),
            Verb::Put => self.client.put(&url),
            Verb::Delete => self.client.delete(&url),
        };
        let mut builder = builder
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json");
        if let Some(body) = body {
            builder = builder
                .header("Content-Type", "application/json")
                .json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!("{} {} failed: {}", verb, url, e);
            NetbirdError::Http(e)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!("Response status: {}", status);
        if !text.is_empty() {
            debug!("Response body: {}", text);
        }

        classify_response(verb, path, status, &text).inspect_err(|e| {
            if matches!(e, NetbirdError::Rejected(_)) {
                error!("422 Validation Error. Request payload: {:?}", body);
            }
        })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetbirdError> {
        let value = self.send(Verb::Get, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a POST request
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NetbirdError> {
        let body = serde_json::to_value(body)?;
        let value = self.send(Verb::Post, path, Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a PUT request
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NetbirdError> {
        let body = serde_json::to_value(body)?;
        let value = self.send(Verb::Put, path, Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a DELETE request; a 404 means the object is already gone
    pub async fn delete(&self, path: &str) -> Result<Deletion, NetbirdError> {
        match self.send(Verb::Delete, path, None).await {
            Ok(_) => Ok(Deletion::Deleted),
            Err(NetbirdError::NotFound(_)) => {
                debug!("DELETE {}: already absent", path);
                Ok(Deletion::AlreadyAbsent)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_decodes_body() {
        let value = classify_response(Verb::Post, "/routes", 201, r#"{"id":"r1"}"#).unwrap();
        assert_eq!(value, json!({"id": "r1"}));
    }

    #[test]
    fn test_empty_success_body_is_empty_object() {
        let value = classify_response(Verb::Delete, "/routes/r1", 200, "").unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_422_is_permanent_and_verbatim() {
        let body = r#"{"message":"invalid peer ID","code":422}"#;
        let err = classify_response(Verb::Post, "/routes", 422, body).unwrap_err();
        match &err {
            NetbirdError::Rejected(detail) => assert_eq!(detail, body),
            other => panic!("expected Rejected, got {:?}", other),
        }
        assert!(err.is_permanent());
    }

    #[test]
    fn test_404_outside_delete_is_transient() {
        let err = classify_response(Verb::Get, "/routes/r1", 404, "").unwrap_err();
        assert!(matches!(err, NetbirdError::NotFound(_)));
        assert!(!err.is_permanent());
    }

    #[test]
    fn test_other_statuses_are_transient() {
        for status in [400u16, 401, 403, 409, 429, 500, 502, 503] {
            let err = classify_response(Verb::Put, "/routes/r1", status, "boom").unwrap_err();
            assert!(!err.is_permanent(), "status {} should be retryable", status);
        }
    }

    #[test]
    fn test_malformed_success_body_is_transient() {
        let err = classify_response(Verb::Get, "/routes/r1", 200, "<html>").unwrap_err();
        assert!(matches!(err, NetbirdError::Serialization(_)));
        assert!(!err.is_permanent());
    }

    #[test]
    fn test_url_joining_and_redaction() {
        let http = HttpClient::new(
            Client::new(),
            "https://netbird.example.com/api/".to_string(),
            "nbp_0123456789abcdef".to_string(),
        );
        assert_eq!(http.build_url("/routes"), "https://netbird.example.com/api/routes");
        assert_eq!(http.build_url("groups/g1"), "https://netbird.example.com/api/groups/g1");
        assert_eq!(http.auth_header(), "Bearer nbp_0123456789abcdef");
        assert_eq!(http.redacted_token(), "Bearer ...89abcdef");
    }

    /// Answer a single request on a local port with `status_line` and hand
    /// back the request line that was received.
    async fn serve_once(status_line: &'static str) -> (String, tokio::sync::oneshot::Receiver<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]);
            let request_line = request.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(request_line);
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                status_line
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        (format!("http://{}/api", addr), rx)
    }

    fn local_client(base_url: String) -> HttpClient {
        HttpClient::new(Client::new(), base_url, "nbp_test_token".to_string())
    }

    #[tokio::test]
    async fn test_delete_404_is_already_absent() {
        let (base_url, request_line) = serve_once("404 Not Found").await;
        let http = local_client(base_url);

        let deletion = http.delete("/routes/r404").await.unwrap();

        assert_eq!(deletion, Deletion::AlreadyAbsent);
        assert_eq!(request_line.await.unwrap(), "DELETE /api/routes/r404 HTTP/1.1");
    }

    #[tokio::test]
    async fn test_delete_2xx_is_deleted() {
        let (base_url, _) = serve_once("200 OK").await;
        let http = local_client(base_url);

        assert_eq!(http.delete("/groups/g1").await.unwrap(), Deletion::Deleted);
    }

    #[tokio::test]
    async fn test_delete_server_error_is_transient() {
        let (base_url, _) = serve_once("500 Internal Server Error").await;
        let http = local_client(base_url);

        let err = http.delete("/routes/r1").await.unwrap_err();
        assert!(matches!(err, NetbirdError::Api { status: 500, .. }));
        assert!(!err.is_permanent());
    }
}
