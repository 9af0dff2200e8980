//! Token persistence contract.

use crate::errors::MotiveResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::RwLock;

/// Tokens persisted for an OAuth connection.
///
/// The access token and its expiry are stored together, so a store is either
/// empty or holds both.
#[derive(Debug, Clone)]
pub struct StoredTokens {
    /// Current access token.
    pub access_token: SecretString,
    /// Refresh token, if the server issued one.
    pub refresh_token: Option<SecretString>,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

/// Persists OAuth tokens on behalf of [`OAuthAuthenticator`](super::OAuthAuthenticator).
///
/// The store is owned by the caller (a database row, an encrypted cache, ...).
/// Implementations shared between concurrent request paths must serialize
/// refreshes themselves, e.g. with a single-flight lock around the
/// read-refresh-store sequence; the authenticator does not.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Reads the stored tokens, if any.
    async fn retrieve(&self) -> MotiveResult<Option<StoredTokens>>;

    /// Replaces the stored tokens.
    async fn store(&self, tokens: StoredTokens) -> MotiveResult<()>;

    /// Removes any stored tokens.
    async fn clear(&self) -> MotiveResult<()>;
}

/// Token store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<Option<StoredTokens>>,
}

impl InMemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with tokens.
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn retrieve(&self) -> MotiveResult<Option<StoredTokens>> {
        Ok(self.tokens.read().await.clone())
    }

    async fn store(&self, tokens: StoredTokens) -> MotiveResult<()> {
        *self.tokens.write().await = Some(tokens);
        Ok(())
    }

    async fn clear(&self) -> MotiveResult<()> {
        *self.tokens.write().await = None;
        Ok(())
    }
}
