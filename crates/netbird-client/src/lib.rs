//! NetBird Management API Client
//!
//! A Rust client library for the NetBird management REST API.
//! Covers the route and group resources the GitOps controller reconciles.
//!
//! # Example
//!
//! ```no_run
//! use netbird_client::{NetbirdClient, NetbirdClientTrait, RouteRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NetbirdClient::new(
//!     "https://api.netbird.io/api".to_string(),
//!     "your-api-token".to_string(),
//! )?;
//!
//! let request = RouteRequest {
//!     description: "office LAN".to_string(),
//!     network: "192.168.1.0/24".to_string(),
//!     peer: "peer-1".to_string(),
//!     groups: vec!["group-1".to_string()],
//!     network_id: "office".to_string(),
//!     enabled: true,
//!     masquerade: false,
//!     metric: 9999,
//!     id: None,
//! };
//! let route = client.create_route(&request).await?;
//! println!("created route {:?}", route.id);
//! # Ok(())
//! # }
//! ```
//!
//! # Response classification
//!
//! - 2xx: success, empty bodies decode as an empty object
//! - 422: [`NetbirdError::Rejected`], permanent
//! - 404: [`NetbirdError::NotFound`], except on delete where it is [`Deletion::AlreadyAbsent`]
//! - anything else, or a transport failure: transient

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod netbird_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::NetbirdClient;
pub use common::{classify_response, HttpClient, Verb};
pub use error::NetbirdError;
pub use models::*;
pub use netbird_trait::NetbirdClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockNetbirdClient, RecordedRequest};
