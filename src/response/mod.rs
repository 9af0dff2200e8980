//! Read-only wrapper over an HTTP response.

use crate::errors::{MotiveError, MotiveResult};
use bytes::Bytes;
use once_cell::sync::OnceCell;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;

/// Response returned by the client pipeline.
///
/// The body is kept as raw bytes and decoded as JSON on first access.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    decoded: OnceCell<Option<Value>>,
}

impl Response {
    /// Creates a response from its parts.
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            decoded: OnceCell::new(),
        }
    }

    /// Reads a `reqwest` response to completion.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self::new(status, headers, body))
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// True for 2xx responses.
    pub fn successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for 4xx and 5xx responses.
    pub fn failed(&self) -> bool {
        self.status >= 400
    }

    /// All response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A single header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text.
    pub fn body(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decoded JSON body, or `None` if the body is not valid JSON.
    pub fn json(&self) -> Option<&Value> {
        self.decoded
            .get_or_init(|| serde_json::from_slice(&self.body).ok())
            .as_ref()
    }

    /// Projects a sub-key of the JSON body. Dots descend into nested objects
    /// and numeric segments index arrays (`pagination.total`, `vehicles.0.id`).
    pub fn json_key(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(self.json()?, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Decodes the whole body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> MotiveResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            MotiveError::deserialization(format!("Failed to deserialize response: {}", e))
                .with_source(e)
        })
    }

    /// Decodes the value at `key` into `T`.
    pub fn decode_key<T: DeserializeOwned>(&self, key: &str) -> MotiveResult<T> {
        let value = self.json_key(key).ok_or_else(|| {
            MotiveError::deserialization(format!("Response has no `{}` key", key))
        })?;
        T::deserialize(value).map_err(|e| {
            MotiveError::deserialization(format!("Failed to deserialize `{}`: {}", key, e))
                .with_source(e)
        })
    }
}
