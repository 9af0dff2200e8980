//! Configuration types for the Motive client.

use crate::errors::{MotiveError, MotiveResult};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Default Motive API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.gomotive.com";

/// Default connection name.
pub const DEFAULT_CONNECTION: &str = "main";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of attempts per request.
pub const DEFAULT_RETRY_TIMES: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Default webhook replay tolerance.
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = "integrations-motive/0.1.0";

/// OAuth client registration.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: SecretString,
    /// Registered redirect URI.
    pub redirect_uri: String,
}

impl OAuthCredentials {
    /// Creates OAuth credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            redirect_uri: redirect_uri.into(),
        }
    }
}

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Static API key sent as `X-Api-Key`.
    ApiKey(SecretString),
    /// OAuth2 bearer token with refresh.
    OAuth(OAuthCredentials),
}

impl AuthMethod {
    /// Creates an API key authentication method.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(SecretString::new(key.into()))
    }

    /// Creates an OAuth authentication method.
    pub fn oauth(credentials: OAuthCredentials) -> Self {
        Self::OAuth(credentials)
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per request, first try included.
    pub times: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            times: DEFAULT_RETRY_TIMES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Inbound webhook configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Shared signing secret.
    pub secret: Option<SecretString>,
    /// Maximum allowed clock skew for timestamped signatures.
    pub tolerance: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            tolerance: DEFAULT_WEBHOOK_TOLERANCE,
        }
    }
}

/// Motive client configuration.
#[derive(Debug, Clone)]
pub struct MotiveConfig {
    /// Connection name this configuration belongs to.
    pub connection_name: String,
    /// API base URL.
    pub base_url: String,
    /// Authentication method.
    pub auth: Option<AuthMethod>,
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Webhook configuration.
    pub webhook: WebhookConfig,
}

impl Default for MotiveConfig {
    fn default() -> Self {
        Self {
            connection_name: DEFAULT_CONNECTION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl MotiveConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> MotiveConfigBuilder {
        MotiveConfigBuilder::new()
    }

    /// Loads configuration from `MOTIVE_*` environment variables.
    ///
    /// `MOTIVE_API_KEY` takes precedence over the OAuth client variables.
    pub fn from_env() -> MotiveResult<Self> {
        let mut builder = MotiveConfigBuilder::new();

        if let Ok(name) = std::env::var("MOTIVE_CONNECTION") {
            builder = builder.connection_name(name);
        }

        if let Ok(url) = std::env::var("MOTIVE_BASE_URL") {
            builder = builder.base_url(url);
        }

        if let Ok(key) = std::env::var("MOTIVE_API_KEY") {
            builder = builder.auth(AuthMethod::api_key(key));
        } else if let (Ok(id), Ok(secret), Ok(redirect)) = (
            std::env::var("MOTIVE_CLIENT_ID"),
            std::env::var("MOTIVE_CLIENT_SECRET"),
            std::env::var("MOTIVE_REDIRECT_URI"),
        ) {
            builder = builder.auth(AuthMethod::oauth(OAuthCredentials::new(id, secret, redirect)));
        }

        if let Some(secs) = env_parse::<u64>("MOTIVE_TIMEOUT")? {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let times = env_parse::<u32>("MOTIVE_RETRY_TIMES")?.unwrap_or(DEFAULT_RETRY_TIMES);
        let delay = env_parse::<u64>("MOTIVE_RETRY_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RETRY_DELAY);
        builder = builder.retry(times, delay);

        if let Ok(secret) = std::env::var("MOTIVE_WEBHOOK_SECRET") {
            builder = builder.webhook_secret(secret);
        }

        if let Some(secs) = env_parse::<u64>("MOTIVE_WEBHOOK_TOLERANCE")? {
            builder = builder.webhook_tolerance(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> MotiveResult<()> {
        if self.connection_name.is_empty() {
            return Err(MotiveError::configuration("Connection name cannot be empty"));
        }

        if self.base_url.is_empty() {
            return Err(MotiveError::configuration("Base URL cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(MotiveError::configuration(
                "Base URL must start with http:// or https://",
            ));
        }

        if self.timeout.is_zero() {
            return Err(MotiveError::configuration("Timeout must be greater than zero"));
        }

        if self.retry.times == 0 {
            return Err(MotiveError::configuration("Retry times must be at least 1"));
        }

        match &self.auth {
            Some(AuthMethod::ApiKey(key)) if key.expose_secret().is_empty() => {
                Err(MotiveError::configuration("API key cannot be empty"))
            }
            Some(AuthMethod::OAuth(creds))
                if creds.client_id.is_empty()
                    || creds.client_secret.expose_secret().is_empty()
                    || creds.redirect_uri.is_empty() =>
            {
                Err(MotiveError::configuration(
                    "OAuth client ID, client secret and redirect URI are required",
                ))
            }
            _ => Ok(()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> MotiveResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MotiveError::configuration(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Builder for MotiveConfig.
#[derive(Debug, Default)]
pub struct MotiveConfigBuilder {
    connection_name: Option<String>,
    base_url: Option<String>,
    auth: Option<AuthMethod>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    retry: Option<RetryConfig>,
    webhook_secret: Option<SecretString>,
    webhook_tolerance: Option<Duration>,
}

impl MotiveConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection name.
    pub fn connection_name(mut self, name: impl Into<String>) -> Self {
        self.connection_name = Some(name.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the authentication method.
    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Uses a static API key.
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.auth(AuthMethod::api_key(key))
    }

    /// Uses OAuth with the given client registration.
    pub fn oauth(self, credentials: OAuthCredentials) -> Self {
        self.auth(AuthMethod::oauth(credentials))
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets total attempts and the delay between them.
    pub fn retry(mut self, times: u32, delay: Duration) -> Self {
        self.retry = Some(RetryConfig { times, delay });
        self
    }

    /// Disables retries (one attempt per request).
    pub fn no_retry(self) -> Self {
        self.retry(1, Duration::ZERO)
    }

    /// Sets the webhook signing secret.
    pub fn webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(SecretString::new(secret.into()));
        self
    }

    /// Sets the webhook replay tolerance.
    pub fn webhook_tolerance(mut self, tolerance: Duration) -> Self {
        self.webhook_tolerance = Some(tolerance);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> MotiveResult<MotiveConfig> {
        let config = MotiveConfig {
            connection_name: self
                .connection_name
                .unwrap_or_else(|| DEFAULT_CONNECTION.to_string()),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            auth: self.auth,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            retry: self.retry.unwrap_or_default(),
            webhook: WebhookConfig {
                secret: self.webhook_secret,
                tolerance: self.webhook_tolerance.unwrap_or(DEFAULT_WEBHOOK_TOLERANCE),
            },
        };

        config.validate()?;
        Ok(config)
    }
}
