//! Error types for the Motive client.

use crate::response::Response;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for Motive operations.
pub type MotiveResult<T> = Result<T, MotiveError>;

/// Fallback message used when an error response carries neither `error` nor `message`.
pub const DEFAULT_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Error kinds for categorizing Motive errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotiveErrorKind {
    // Configuration errors
    /// Invalid or incomplete configuration.
    Configuration,
    /// The request could not be built (bad path, body not an object, ...).
    InvalidRequest,

    // Transport errors
    /// Connection-level failure.
    Connection,
    /// Request timed out.
    Timeout,

    // HTTP errors
    /// Credential invalid or expired (401).
    Authentication,
    /// Credential valid but insufficient (403).
    Authorization,
    /// Resource not found (404).
    NotFound,
    /// Request validation failed (422).
    Validation,
    /// Rate limit exceeded (429).
    RateLimit,
    /// Server-side failure (5xx).
    Server,
    /// Any other non-2xx response.
    Api,

    // Response errors
    /// Failed to decode a response body.
    Deserialization,

    // OAuth errors
    /// Token endpoint returned a non-2xx or unusable response.
    OAuthFlow,
    /// Token store read or write failed.
    TokenStore,

    // Webhook errors
    /// Signature header absent.
    MissingSignature,
    /// Signature did not match.
    InvalidSignature,
    /// Timestamp outside the replay window.
    ExpiredTimestamp,
    /// Verified payload could not be decoded.
    InvalidPayload,
}

impl MotiveErrorKind {
    /// Maps an HTTP status code to an error kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            403 => Self::Authorization,
            404 => Self::NotFound,
            422 => Self::Validation,
            429 => Self::RateLimit,
            s if s >= 500 => Self::Server,
            _ => Self::Api,
        }
    }

    /// Returns true for webhook verification failures.
    pub fn is_webhook_verification(&self) -> bool {
        matches!(
            self,
            Self::MissingSignature | Self::InvalidSignature | Self::ExpiredTimestamp
        )
    }
}

impl fmt::Display for MotiveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configuration => "configuration",
            Self::InvalidRequest => "invalid_request",
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::RateLimit => "rate_limit",
            Self::Server => "server",
            Self::Api => "api",
            Self::Deserialization => "deserialization",
            Self::OAuthFlow => "oauth_flow",
            Self::TokenStore => "token_store",
            Self::MissingSignature => "missing_signature",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredTimestamp => "expired_timestamp",
            Self::InvalidPayload => "invalid_payload",
        };
        write!(f, "{}", s)
    }
}

/// Lower-level error that caused a [`MotiveError`].
#[derive(Error, Debug)]
pub enum ErrorSource {
    /// Transport error from the HTTP client.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// JSON encoding or decoding error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// URL parse error.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Motive API error with detailed information.
#[derive(Error, Debug)]
#[error("[{kind}] {message}")]
pub struct MotiveError {
    kind: MotiveErrorKind,
    message: String,
    response: Option<Response>,
    field_errors: HashMap<String, Vec<String>>,
    retry_after: Option<u64>,
    #[source]
    source: Option<ErrorSource>,
}

impl MotiveError {
    /// Creates a new error.
    pub fn new(kind: MotiveErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
            field_errors: HashMap::new(),
            retry_after: None,
            source: None,
        }
    }

    /// Attaches the response that produced this error.
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<ErrorSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets field-level validation messages.
    pub fn with_field_errors(mut self, errors: HashMap<String, Vec<String>>) -> Self {
        self.field_errors = errors;
        self
    }

    /// Sets the retry-after value in seconds.
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> MotiveErrorKind {
        self.kind
    }

    /// Gets the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Gets the response that produced this error, if any.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Gets the HTTP status code, if the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(Response::status)
    }

    /// Field-level validation messages (populated for 422 responses).
    pub fn field_errors(&self) -> &HashMap<String, Vec<String>> {
        &self.field_errors
    }

    /// Seconds to wait before resubmitting (populated for 429 responses).
    pub fn retry_after(&self) -> Option<u64> {
        self.retry_after
    }

    /// Returns true if the pipeline retries this error automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            MotiveErrorKind::Connection | MotiveErrorKind::Timeout | MotiveErrorKind::Server
        )
    }

    /// Builds the typed error for a non-2xx response.
    pub fn from_response(response: Response) -> Self {
        let kind = MotiveErrorKind::from_status(response.status());
        let message = extract_message(&response);
        let mut error = Self::new(kind, message);

        match kind {
            MotiveErrorKind::Validation => {
                error.field_errors = extract_field_errors(&response);
            }
            MotiveErrorKind::RateLimit => {
                error.retry_after = response
                    .header("retry-after")
                    .and_then(|v| v.trim().parse().ok());
            }
            _ => {}
        }

        error.with_response(response)
    }

    // Convenience constructors

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(MotiveErrorKind::Configuration, message)
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(MotiveErrorKind::InvalidRequest, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(MotiveErrorKind::Authentication, message)
    }

    /// Creates a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(MotiveErrorKind::Deserialization, message)
    }

    /// Creates an OAuth flow error.
    pub fn oauth_flow(message: impl Into<String>) -> Self {
        Self::new(MotiveErrorKind::OAuthFlow, message)
    }

    /// Creates a token store error.
    pub fn token_store(message: impl Into<String>) -> Self {
        Self::new(MotiveErrorKind::TokenStore, message)
    }

    /// Creates a missing signature error.
    pub fn missing_signature() -> Self {
        Self::new(MotiveErrorKind::MissingSignature, "Webhook signature header is missing")
    }

    /// Creates an invalid signature error.
    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(MotiveErrorKind::InvalidSignature, message)
    }

    /// Creates an expired timestamp error.
    pub fn expired_timestamp(timestamp: i64) -> Self {
        Self::new(
            MotiveErrorKind::ExpiredTimestamp,
            format!("Webhook timestamp {} is outside the tolerance window", timestamp),
        )
    }

    /// Creates an invalid webhook payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(MotiveErrorKind::InvalidPayload, message)
    }
}

/// Extracts the server-supplied message: `error`, then `message`, then the fallback.
fn extract_message(response: &Response) -> String {
    let body = match response.json() {
        Some(body) => body,
        None => return DEFAULT_ERROR_MESSAGE.to_string(),
    };

    ["error", "message"]
        .iter()
        .find_map(|key| match body.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Object(obj)) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(String::from),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}

/// Reads `errors` as either `{field: [msg, ..]}` or `{field: msg}`.
fn extract_field_errors(response: &Response) -> HashMap<String, Vec<String>> {
    let errors = match response.json_key("errors") {
        Some(Value::Object(errors)) => errors,
        _ => return HashMap::new(),
    };

    errors
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::Array(items) => items
                    .iter()
                    .map(|m| m.as_str().map(String::from).unwrap_or_else(|| m.to_string()))
                    .collect(),
                Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect()
}
