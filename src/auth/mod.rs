//! Authentication for the Motive API.
//!
//! An [`Authenticator`] decides which credential header a request carries and
//! whether that credential has to be refreshed first. The two steps are kept
//! separate on purpose: `authenticate` never performs network I/O, and the
//! client pipeline checks [`Authenticator::is_expired`] and calls
//! [`Authenticator::refresh`] before every request.

mod oauth;
mod store;

pub use oauth::{AccessToken, OAuthAuthenticator, OAuthFlow, Scope, DEFAULT_EXPIRATION_BUFFER};
pub use store::{InMemoryTokenStore, StoredTokens, TokenStore};

use crate::errors::MotiveResult;
use crate::request::PendingRequest;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

/// Header carrying a static API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Header carrying an OAuth bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Attaches credentials to outgoing requests.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns a copy of `request` with exactly one credential header attached.
    async fn authenticate(&self, request: &PendingRequest) -> MotiveResult<PendingRequest>;

    /// Reports whether credentials must be refreshed before the next request.
    async fn is_expired(&self) -> MotiveResult<bool>;

    /// Obtains and persists new credentials.
    async fn refresh(&self) -> MotiveResult<()>;
}

/// Authenticates with a static API key.
#[derive(Debug, Clone)]
pub struct ApiKeyAuthenticator {
    api_key: SecretString,
}

impl ApiKeyAuthenticator {
    /// Creates an API key authenticator.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
        }
    }

    /// Creates an authenticator from an already wrapped secret.
    pub fn from_secret(api_key: SecretString) -> Self {
        Self { api_key }
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &PendingRequest) -> MotiveResult<PendingRequest> {
        Ok(request.with_header(API_KEY_HEADER, self.api_key.expose_secret().as_str()))
    }

    async fn is_expired(&self) -> MotiveResult<bool> {
        Ok(false)
    }

    async fn refresh(&self) -> MotiveResult<()> {
        // API keys do not expire
        Ok(())
    }
}
