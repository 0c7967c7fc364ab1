//! NetBird client errors

use thiserror::Error;

/// Errors that can occur when interacting with the NetBird API
#[derive(Debug, Error)]
pub enum NetbirdError {
    /// Transport failure (connection refused, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the semantic content of the request (HTTP 422)
    #[error("API validation failed: {0}")]
    Rejected(String),

    /// Resource not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("NetBird API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client was constructed with unusable settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NetbirdError {
    /// Whether retrying the same request can never succeed.
    ///
    /// Only a 422 rejection and a broken client configuration are permanent;
    /// 404 outside of delete, other statuses, transport failures and
    /// undecodable bodies are all worth retrying.
    pub fn is_permanent(&self) -> bool {
        matches!(self, NetbirdError::Rejected(_) | NetbirdError::InvalidConfig(_))
    }
}
