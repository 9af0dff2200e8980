//! Webhook verification and handling.
//!
//! Motive signs each delivery with HMAC-SHA256 over the raw body. When the
//! `X-Motive-Timestamp` header is present the signature covers
//! `"{timestamp}.{body}"` and the timestamp must be fresh.

mod payload;
pub mod signature;

pub use payload::{WebhookEvent, WebhookPayload};

use crate::config::{WebhookConfig, DEFAULT_WEBHOOK_TOLERANCE};
use crate::errors::{MotiveError, MotiveResult};
use chrono::Utc;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "X-Motive-Signature";

/// Header carrying the Unix timestamp of a timestamped signature.
pub const TIMESTAMP_HEADER: &str = "X-Motive-Timestamp";

/// Verifies inbound webhook requests.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance: Duration,
}

impl WebhookVerifier {
    /// Creates a verifier with the default 300 second tolerance.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            tolerance: DEFAULT_WEBHOOK_TOLERANCE,
        }
    }

    /// Creates a verifier from configuration. The secret is required.
    pub fn from_config(config: &WebhookConfig) -> MotiveResult<Self> {
        let secret = config
            .secret
            .clone()
            .ok_or_else(|| MotiveError::configuration("Webhook secret is not configured"))?;
        Ok(Self {
            secret,
            tolerance: config.tolerance,
        })
    }

    /// Sets the timestamp tolerance.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Timestamp tolerance.
    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verifies a request from its headers and raw body.
    pub fn verify_request(&self, headers: &HeaderMap, body: &[u8]) -> MotiveResult<()> {
        self.verify_parts(
            header_str(headers, SIGNATURE_HEADER),
            header_str(headers, TIMESTAMP_HEADER),
            body,
        )
    }

    /// Verifies the signature and timestamp header values against `body`.
    pub fn verify_parts(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> MotiveResult<()> {
        self.verify_parts_at(signature, timestamp, body, Utc::now().timestamp())
    }

    /// Like [`verify_parts`](Self::verify_parts) with an explicit `now` (Unix seconds).
    pub fn verify_parts_at(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> MotiveResult<()> {
        let signature = match signature.map(str::trim) {
            Some(signature) if !signature.is_empty() => signature,
            _ => {
                warn!("Webhook request has no signature");
                return Err(MotiveError::missing_signature());
            }
        };

        let secret = self.secret.expose_secret();

        let valid = match timestamp.map(str::trim).filter(|ts| !ts.is_empty()) {
            None => signature::verify(body, signature, secret),
            Some(raw) => {
                let ts: i64 = raw.parse().map_err(|_| {
                    warn!(timestamp = raw, "Invalid webhook timestamp format");
                    MotiveError::invalid_signature("Invalid timestamp format")
                })?;

                if !signature::timestamp_within_tolerance(ts, self.tolerance, now) {
                    warn!(
                        timestamp = ts,
                        now,
                        tolerance = self.tolerance.as_secs(),
                        "Webhook timestamp outside tolerance"
                    );
                    return Err(MotiveError::expired_timestamp(ts));
                }

                signature::verify_with_timestamp_at(body, signature, secret, ts, self.tolerance, now)
            }
        };

        if !valid {
            warn!("Webhook signature verification failed");
            return Err(MotiveError::invalid_signature("Signature does not match"));
        }

        debug!("Webhook signature verified");
        Ok(())
    }

    /// Verifies a request and parses its body.
    pub fn verify_and_parse(&self, headers: &HeaderMap, body: &[u8]) -> MotiveResult<WebhookPayload> {
        self.verify_request(headers, body)?;
        WebhookPayload::from_slice(body)
    }
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
