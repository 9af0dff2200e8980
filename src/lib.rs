//! # Motive Integration Library
//!
//! A typed client for the Motive fleet-management REST API with:
//! - API key and OAuth 2.0 authentication with refresh-before-send
//! - Immutable request building and a typed error taxonomy
//! - Retry on connection failures and 5xx responses
//! - Page-number pagination, single page or lazily streamed
//! - Webhook signature verification and payload parsing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::TryStreamExt;
//! use integrations_motive::{MotiveClient, Vehicle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MotiveClient::builder().api_key("your-api-key").build()?;
//!
//!     let vehicles: Vec<Vehicle> = client.vehicles().list().cursor().try_collect().await?;
//!     for vehicle in vehicles {
//!         println!("{} {:?}", vehicle.id, vehicle.number);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// Authentication
pub mod auth;

// Request and response values
pub mod request;
pub mod response;

// HTTP client and transport
pub mod client;

// Pagination handling
pub mod pagination;

// API Services
pub mod services;

// Webhooks
pub mod webhooks;

// Resilience patterns
pub mod resilience;

// Named connections
pub mod connections;

// Re-exports for convenience
pub use auth::{
    AccessToken, ApiKeyAuthenticator, Authenticator, InMemoryTokenStore, OAuthAuthenticator,
    OAuthFlow, Scope, StoredTokens, TokenStore,
};
pub use client::{MotiveClient, MotiveClientBuilder};
pub use config::{AuthMethod, MotiveConfig, MotiveConfigBuilder, OAuthCredentials};
pub use connections::ConnectionManager;
pub use errors::{MotiveError, MotiveErrorKind, MotiveResult};
pub use pagination::{LazyPaginator, PaginatedResponse, Paginator};
pub use request::PendingRequest;
pub use response::Response;
pub use types::*;
pub use webhooks::{WebhookEvent, WebhookPayload, WebhookVerifier};
