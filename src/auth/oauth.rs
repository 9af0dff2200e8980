//! OAuth2 authorization-code flow and the bearer-token authenticator.

use super::store::{StoredTokens, TokenStore};
use super::{Authenticator, AUTHORIZATION_HEADER};
use crate::config::OAuthCredentials;
use crate::errors::{MotiveError, MotiveResult};
use crate::request::PendingRequest;
use crate::response::Response;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::ACCEPT;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Default refresh buffer before token expiry (5 minutes).
pub const DEFAULT_EXPIRATION_BUFFER: std::time::Duration = std::time::Duration::from_secs(300);

/// OAuth scopes understood by the Motive authorization server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Read company profile.
    CompaniesRead,
    /// Read users and drivers.
    UsersRead,
    /// Create and update users and drivers.
    UsersManage,
    /// Read vehicles.
    VehiclesRead,
    /// Create and update vehicles.
    VehiclesManage,
    /// Read vehicle and driver locations.
    LocationsRead,
    /// Read hours-of-service logs.
    HosLogsRead,
    /// Read dispatches.
    DispatchesRead,
    /// Create and update dispatches.
    DispatchesManage,
    /// Read documents.
    DocumentsRead,
    /// Manage webhook subscriptions.
    WebhooksManage,
    /// Any other scope string.
    Custom(String),
}

impl Scope {
    /// Wire value of the scope.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CompaniesRead => "companies.read",
            Self::UsersRead => "users.read",
            Self::UsersManage => "users.manage",
            Self::VehiclesRead => "vehicles.read",
            Self::VehiclesManage => "vehicles.manage",
            Self::LocationsRead => "locations.read",
            Self::HosLogsRead => "hos_logs.read",
            Self::DispatchesRead => "dispatches.read",
            Self::DispatchesManage => "dispatches.manage",
            Self::DocumentsRead => "documents.read",
            Self::WebhooksManage => "webhooks.manage",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl AsRef<str> for Scope {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token issued by the token endpoint. A refresh produces a new value.
#[derive(Debug, Clone)]
pub struct AccessToken {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<ExpiresAt>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresAt {
    Timestamp(i64),
    Rfc3339(String),
}

impl AccessToken {
    /// Creates a token from its parts.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            refresh_token: refresh_token.map(SecretString::new),
            expires_at,
        }
    }

    /// Parses a token endpoint response body.
    ///
    /// An absolute `expires_at` (Unix seconds or RFC 3339) wins over a relative
    /// `expires_in`, which is counted from `now`.
    pub fn from_response_at(body: &Value, now: DateTime<Utc>) -> MotiveResult<Self> {
        let parsed: TokenResponse = serde_json::from_value(body.clone()).map_err(|e| {
            MotiveError::oauth_flow(format!("Malformed token response: {}", e)).with_source(e)
        })?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MotiveError::oauth_flow("Token response has no access_token"))?;

        let expires_at = match (parsed.expires_at, parsed.expires_in) {
            (Some(ExpiresAt::Timestamp(ts)), _) => DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| MotiveError::oauth_flow(format!("Invalid expires_at: {}", ts)))?,
            (Some(ExpiresAt::Rfc3339(raw)), _) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| MotiveError::oauth_flow(format!("Invalid expires_at {}: {}", raw, e)))?,
            (None, Some(seconds)) => Duration::try_seconds(seconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .ok_or_else(|| {
                    MotiveError::oauth_flow(format!("Invalid expires_in: {}", seconds))
                })?,
            (None, None) => {
                return Err(MotiveError::oauth_flow(
                    "Token response has neither expires_at nor expires_in",
                ))
            }
        };

        Ok(Self::new(
            access_token,
            parsed.refresh_token.filter(|t| !t.is_empty()),
            expires_at,
        ))
    }

    /// The access token.
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// The refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    /// When the access token expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Authorization URL construction and token exchange.
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    http: Client,
    base_url: String,
    credentials: OAuthCredentials,
    timeout: std::time::Duration,
}

impl OAuthFlow {
    /// Creates a flow against the authorization server at `base_url`.
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        credentials: OAuthCredentials,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
            timeout,
        }
    }

    fn endpoint(&self, path: &str) -> MotiveResult<Url> {
        let raw = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| {
            MotiveError::configuration(format!("Invalid OAuth URL {}: {}", raw, e)).with_source(e)
        })
    }

    /// Builds the URL users are sent to for consent.
    ///
    /// Scopes are space-joined in the order given.
    pub fn authorization_url<S: AsRef<str>>(
        &self,
        scopes: &[S],
        state: Option<&str>,
    ) -> MotiveResult<Url> {
        let mut url = self.endpoint("oauth/authorize")?;
        let scope = scopes
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.credentials.client_id)
                .append_pair("redirect_uri", &self.credentials.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &scope);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }

        Ok(url)
    }

    /// Exchanges an authorization code for a token.
    pub async fn exchange_code(&self, code: &str) -> MotiveResult<AccessToken> {
        tracing::debug!("Exchanging authorization code");
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.expose_secret().as_str()),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ])
        .await
    }

    /// Trades a refresh token for a new token.
    pub async fn refresh_token(&self, refresh_token: &str) -> MotiveResult<AccessToken> {
        tracing::debug!("Refreshing access token");
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.expose_secret().as_str()),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> MotiveResult<AccessToken> {
        let url = self.endpoint("oauth/token")?;

        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| {
                MotiveError::oauth_flow(format!("Token request failed: {}", e)).with_source(e)
            })?;

        let response = Response::from_reqwest(response).await.map_err(|e| {
            MotiveError::oauth_flow(format!("Failed to read token response: {}", e)).with_source(e)
        })?;

        if !response.successful() {
            let reason = ["error_description", "error", "message"]
                .iter()
                .find_map(|key| response.json_key(key).and_then(Value::as_str))
                .unwrap_or("no error description")
                .to_string();
            let message = format!("Token endpoint returned HTTP {}: {}", response.status(), reason);
            return Err(MotiveError::oauth_flow(message).with_response(response));
        }

        let body = response
            .json()
            .ok_or_else(|| MotiveError::oauth_flow("Token endpoint returned malformed JSON"))?;

        AccessToken::from_response_at(body, Utc::now())
    }
}

/// Authenticates with an OAuth bearer token read from a [`TokenStore`].
///
/// `authenticate` only reads the store. Callers outside the client pipeline
/// must check [`Authenticator::is_expired`] and call [`Authenticator::refresh`]
/// themselves before authenticating.
pub struct OAuthAuthenticator {
    flow: OAuthFlow,
    store: Arc<dyn TokenStore>,
    expiration_buffer: Duration,
}

impl OAuthAuthenticator {
    /// Creates an authenticator with the default 5 minute buffer.
    pub fn new(flow: OAuthFlow, store: Arc<dyn TokenStore>) -> Self {
        Self {
            flow,
            store,
            expiration_buffer: buffer_from_std(DEFAULT_EXPIRATION_BUFFER),
        }
    }

    /// Sets how long before expiry a token is treated as expired.
    pub fn with_expiration_buffer(mut self, buffer: std::time::Duration) -> Self {
        self.expiration_buffer = buffer_from_std(buffer);
        self
    }

    /// The underlying OAuth flow.
    pub fn flow(&self) -> &OAuthFlow {
        &self.flow
    }

    /// The token store.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Exchanges an authorization code and persists the resulting tokens.
    pub async fn complete_authorization(&self, code: &str) -> MotiveResult<AccessToken> {
        let token = self.flow.exchange_code(code).await?;
        self.store
            .store(StoredTokens {
                access_token: token.access_token.clone(),
                refresh_token: token.refresh_token.clone(),
                expires_at: token.expires_at,
            })
            .await?;
        Ok(token)
    }
}

impl fmt::Debug for OAuthAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthAuthenticator")
            .field("flow", &self.flow)
            .field("expiration_buffer", &self.expiration_buffer)
            .finish_non_exhaustive()
    }
}

/// Whole seconds of `buffer`, saturating at the largest representable delta.
fn buffer_from_std(buffer: std::time::Duration) -> Duration {
    i64::try_from(buffer.as_secs())
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// True when `now + buffer` has reached `expires_at`. A sum past the end of
/// time counts as expired.
pub(crate) fn token_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>, buffer: Duration) -> bool {
    now.checked_add_signed(buffer)
        .map_or(true, |deadline| deadline >= expires_at)
}

#[async_trait]
impl Authenticator for OAuthAuthenticator {
    async fn authenticate(&self, request: &PendingRequest) -> MotiveResult<PendingRequest> {
        let tokens = self
            .store
            .retrieve()
            .await?
            .ok_or_else(|| MotiveError::authentication("No OAuth access token is stored"))?;

        Ok(request.with_header(
            AUTHORIZATION_HEADER,
            format!("Bearer {}", tokens.access_token.expose_secret()),
        ))
    }

    async fn is_expired(&self) -> MotiveResult<bool> {
        Ok(match self.store.retrieve().await? {
            Some(tokens) => token_expired(tokens.expires_at, Utc::now(), self.expiration_buffer),
            None => true,
        })
    }

    async fn refresh(&self) -> MotiveResult<()> {
        let current = match self.store.retrieve().await? {
            Some(tokens) => tokens,
            None => {
                tracing::warn!("No stored tokens to refresh; re-authorization required");
                return Ok(());
            }
        };

        let refresh_token = match current.refresh_token {
            Some(token) => token,
            None => {
                tracing::warn!("No refresh token stored; re-authorization required");
                return Ok(());
            }
        };

        let token = self.flow.refresh_token(refresh_token.expose_secret()).await?;

        // Some servers omit refresh_token on refresh; keep the one we used.
        self.store
            .store(StoredTokens {
                access_token: token.access_token,
                refresh_token: token.refresh_token.or(Some(refresh_token)),
                expires_at: token.expires_at,
            })
            .await?;

        tracing::debug!(expires_at = %token.expires_at, "Access token refreshed");
        Ok(())
    }
}
