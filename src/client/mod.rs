//! Motive API client implementation.

use crate::auth::{ApiKeyAuthenticator, Authenticator, OAuthAuthenticator, OAuthFlow, TokenStore};
use crate::config::{AuthMethod, MotiveConfig, MotiveConfigBuilder, OAuthCredentials};
use crate::errors::{MotiveError, MotiveErrorKind, MotiveResult};
use crate::pagination::{LazyPaginator, Paginator};
use crate::request::{to_object, to_query_pairs, PendingRequest};
use crate::resilience::RetryExecutor;
use crate::response::Response;
use crate::services::{UsersService, VehiclesService, WebhooksService};
use crate::webhooks::WebhookVerifier;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Motive API client.
///
/// Every call goes through the same pipeline: refresh expired credentials,
/// attach the credential header, send with retry on transport failures and
/// 5xx responses, then map non-2xx responses to a typed [`MotiveError`].
pub struct MotiveClient {
    http: Client,
    config: MotiveConfig,
    authenticator: Arc<dyn Authenticator>,
    oauth: Option<OAuthFlow>,
    retry: RetryExecutor,
}

impl MotiveClient {
    /// Creates a client that authenticates with `authenticator`.
    pub fn new(config: MotiveConfig, authenticator: Arc<dyn Authenticator>) -> MotiveResult<Self> {
        config.validate()?;
        let http = build_http(&config)?;
        let oauth = oauth_flow(&http, &config);
        Ok(Self::from_parts(http, config, authenticator, oauth))
    }

    /// Creates a client from configuration using an API key.
    ///
    /// OAuth configurations need a token store; use [`MotiveClient::builder`].
    pub fn from_config(config: MotiveConfig) -> MotiveResult<Self> {
        MotiveClientBuilder::new().config(config).build()
    }

    /// Creates a new client builder.
    pub fn builder() -> MotiveClientBuilder {
        MotiveClientBuilder::new()
    }

    fn from_parts(
        http: Client,
        config: MotiveConfig,
        authenticator: Arc<dyn Authenticator>,
        oauth: Option<OAuthFlow>,
    ) -> Self {
        let retry = RetryExecutor::new(config.retry.times, config.retry.delay);
        Self {
            http,
            config,
            authenticator,
            oauth,
            retry,
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &MotiveConfig {
        &self.config
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Gets the connection name.
    pub fn connection_name(&self) -> &str {
        &self.config.connection_name
    }

    /// Gets the authenticator.
    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    /// Gets the OAuth flow when the client is configured for OAuth.
    pub fn oauth_flow(&self) -> Option<&OAuthFlow> {
        self.oauth.as_ref()
    }

    /// Builds a webhook verifier from the configured secret and tolerance.
    pub fn webhook_verifier(&self) -> MotiveResult<WebhookVerifier> {
        WebhookVerifier::from_config(&self.config.webhook)
    }

    /// A request pre-populated with the base URL, timeout and default headers.
    pub fn pending_request(&self) -> PendingRequest {
        PendingRequest::new(&self.config.base_url, self.config.timeout)
            .with_header(ACCEPT.as_str(), "application/json")
            .with_header(USER_AGENT.as_str(), &self.config.user_agent)
    }

    // Service accessors

    /// Gets the vehicles service.
    pub fn vehicles(&self) -> VehiclesService<'_> {
        VehiclesService::new(self)
    }

    /// Gets the users service.
    pub fn users(&self) -> UsersService<'_> {
        UsersService::new(self)
    }

    /// Gets the webhooks service.
    pub fn webhooks(&self) -> WebhooksService<'_> {
        WebhooksService::new(self)
    }

    // Pagination

    /// Single-page paginator over a list endpoint.
    pub fn paginator<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        resource_key: impl Into<String>,
    ) -> Paginator<'_, T> {
        Paginator::new(self, path, resource_key)
    }

    /// Lazy paginator over every page of a list endpoint.
    pub fn lazy_paginator<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        resource_key: impl Into<String>,
    ) -> LazyPaginator<'_, T> {
        LazyPaginator::new(self, path, resource_key)
    }

    // HTTP methods

    /// Makes a GET request. `query` must serialize to a JSON object (or `()`).
    pub async fn get<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> MotiveResult<Response> {
        let query = to_object(query, "query")?;
        self.send(Method::GET, path, query, Map::new()).await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> MotiveResult<Response> {
        let body = to_object(body, "body")?;
        self.send(Method::POST, path, Map::new(), body).await
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> MotiveResult<Response> {
        let body = to_object(body, "body")?;
        self.send(Method::PUT, path, Map::new(), body).await
    }

    /// Makes a PATCH request with a JSON body.
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> MotiveResult<Response> {
        let body = to_object(body, "body")?;
        self.send(Method::PATCH, path, Map::new(), body).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, path: &str) -> MotiveResult<Response> {
        self.send(Method::DELETE, path, Map::new(), Map::new()).await
    }

    /// Sends a request through the full pipeline.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: Map<String, Value>,
        body: Map<String, Value>,
    ) -> MotiveResult<Response> {
        if self.authenticator.is_expired().await? {
            tracing::debug!(
                connection = %self.config.connection_name,
                "Credentials expired, refreshing before request"
            );
            self.authenticator.refresh().await?;
        }

        let request = self
            .pending_request()
            .with_query(to_query_pairs(&query))
            .with_body(body);
        let request = self.authenticator.authenticate(&request).await?;

        tracing::debug!(method = %method, path = path, "Sending request");

        let method = &method;
        let request = &request;
        self.retry
            .execute(move || self.execute_once(method, path, request))
            .await
    }

    async fn execute_once(
        &self,
        method: &Method,
        path: &str,
        request: &PendingRequest,
    ) -> MotiveResult<Response> {
        let response = request
            .build(&self.http, method, path)
            .send()
            .await
            .map_err(transport_error)?;

        let response = Response::from_reqwest(response)
            .await
            .map_err(transport_error)?;

        if response.successful() {
            Ok(response)
        } else {
            Err(MotiveError::from_response(response))
        }
    }
}

impl fmt::Debug for MotiveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotiveClient")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn transport_error(e: reqwest::Error) -> MotiveError {
    let error = if e.is_timeout() {
        MotiveError::new(MotiveErrorKind::Timeout, format!("Request timed out: {}", e))
    } else if e.is_builder() {
        MotiveError::invalid_request(format!("Failed to build request: {}", e))
    } else {
        MotiveError::new(MotiveErrorKind::Connection, format!("Connection failed: {}", e))
    };
    error.with_source(e)
}

fn build_http(config: &MotiveConfig) -> MotiveResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| {
            MotiveError::configuration(format!("Failed to create HTTP client: {}", e)).with_source(e)
        })
}

fn oauth_flow(http: &Client, config: &MotiveConfig) -> Option<OAuthFlow> {
    match &config.auth {
        Some(AuthMethod::OAuth(credentials)) => Some(OAuthFlow::new(
            http.clone(),
            &config.base_url,
            credentials.clone(),
            config.timeout,
        )),
        _ => None,
    }
}

/// Builder for MotiveClient.
pub struct MotiveClientBuilder {
    config_builder: MotiveConfigBuilder,
    config: Option<MotiveConfig>,
    authenticator: Option<Arc<dyn Authenticator>>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl MotiveClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: MotiveConfig::builder(),
            config: None,
            authenticator: None,
            token_store: None,
        }
    }

    /// Uses a complete configuration, ignoring the individual setters.
    pub fn config(mut self, config: MotiveConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the connection name.
    pub fn connection_name(mut self, name: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.connection_name(name);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(url);
        self
    }

    /// Uses a static API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(key);
        self
    }

    /// Uses OAuth; requires a token store.
    pub fn oauth(mut self, credentials: OAuthCredentials) -> Self {
        self.config_builder = self.config_builder.oauth(credentials);
        self
    }

    /// Sets the store holding OAuth tokens.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Uses a custom authenticator instead of one derived from configuration.
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets total attempts and the delay between them.
    pub fn retry(mut self, times: u32, delay: Duration) -> Self {
        self.config_builder = self.config_builder.retry(times, delay);
        self
    }

    /// Disables retries.
    pub fn no_retry(mut self) -> Self {
        self.config_builder = self.config_builder.no_retry();
        self
    }

    /// Sets the webhook signing secret.
    pub fn webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.webhook_secret(secret);
        self
    }

    /// Builds the client.
    pub fn build(self) -> MotiveResult<MotiveClient> {
        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => self.config_builder.build()?,
        };

        let http = build_http(&config)?;
        let oauth = oauth_flow(&http, &config);

        let authenticator: Arc<dyn Authenticator> = match (self.authenticator, &config.auth) {
            (Some(authenticator), _) => authenticator,
            (None, Some(AuthMethod::ApiKey(key))) => {
                Arc::new(ApiKeyAuthenticator::from_secret(key.clone()))
            }
            (None, Some(AuthMethod::OAuth(credentials))) => {
                let store = self.token_store.ok_or_else(|| {
                    MotiveError::configuration("OAuth authentication requires a token store")
                })?;
                let flow = OAuthFlow::new(
                    http.clone(),
                    &config.base_url,
                    credentials.clone(),
                    config.timeout,
                );
                Arc::new(OAuthAuthenticator::new(flow, store))
            }
            (None, None) => {
                return Err(MotiveError::configuration("Authentication is required"));
            }
        };

        Ok(MotiveClient::from_parts(http, config, authenticator, oauth))
    }
}

impl Default for MotiveClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
