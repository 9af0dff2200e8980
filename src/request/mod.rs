//! Immutable request builder.

use crate::errors::{MotiveError, MotiveResult};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// A request that has not been sent yet.
///
/// Every `with_*` method returns a new value; the receiver is left untouched,
/// so partially built requests can be shared and extended independently.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    base_url: String,
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    body: Map<String, Value>,
    timeout: Duration,
}

impl PendingRequest {
    /// Creates an empty request against `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            body: Map::new(),
            timeout,
        }
    }

    /// Returns a copy with `name` set to `value`, replacing any existing
    /// header of the same name regardless of case.
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let name = name.into();
        next.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        next.headers.insert(name, value.into());
        next
    }

    /// Returns a copy with all `headers` added.
    pub fn with_headers<I, K, V>(&self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self.clone(), |request, (name, value)| request.with_header(name, value))
    }

    /// Returns a copy with the query parameters merged in.
    pub fn with_query<I, K, V>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut next = self.clone();
        next.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        next
    }

    /// Returns a copy with the body fields merged in.
    pub fn with_body(&self, body: Map<String, Value>) -> Self {
        let mut next = self.clone();
        next.body.extend(body);
        next
    }

    /// Returns a copy with a different timeout.
    pub fn timeout(&self, timeout: Duration) -> Self {
        let mut next = self.clone();
        next.timeout = timeout;
        next
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers set so far.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// A header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Query parameters set so far.
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Body fields set so far.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Request timeout.
    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Joins the base URL and `path` with exactly one `/`.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Frames the request for `method`: GET sends the query, POST/PUT/PATCH send
    /// the query and a JSON body, DELETE sends neither.
    pub(crate) fn build(&self, http: &Client, method: &Method, path: &str) -> RequestBuilder {
        let mut builder = http
            .request(method.clone(), self.url_for(path))
            .timeout(self.timeout);

        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if *method == Method::DELETE {
            return builder;
        }

        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }

        if *method != Method::GET {
            builder = builder.json(&self.body);
        }

        builder
    }
}

/// Serializes `value` into a JSON object.
pub(crate) fn to_object<T: Serialize + ?Sized>(value: &T, what: &str) -> MotiveResult<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(MotiveError::invalid_request(format!(
            "{} must serialize to a JSON object",
            what
        ))),
        Err(e) => Err(MotiveError::invalid_request(format!(
            "Failed to serialize {}: {}",
            what, e
        ))
        .with_source(e)),
    }
}

/// Flattens a JSON object into query parameters.
///
/// Strings are sent verbatim, arrays are comma-joined and `null` values are dropped.
pub(crate) fn to_query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| query_value(value).map(|v| (key.clone(), v)))
        .collect()
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}
