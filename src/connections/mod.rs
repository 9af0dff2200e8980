//! Named client connections.

use crate::client::MotiveClient;
use crate::config::DEFAULT_CONNECTION;
use crate::errors::{MotiveError, MotiveResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of clients keyed by connection name.
///
/// Each connection can point at a different account with its own credentials.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    connections: HashMap<String, Arc<MotiveClient>>,
    default: String,
}

impl ConnectionManager {
    /// Creates an empty registry whose default connection is `main`.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            default: DEFAULT_CONNECTION.to_string(),
        }
    }

    /// Registers a client under its configured connection name.
    pub fn add(&mut self, client: MotiveClient) -> Arc<MotiveClient> {
        let name = client.connection_name().to_string();
        self.insert(name, client)
    }

    /// Registers a client under `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, client: MotiveClient) -> Arc<MotiveClient> {
        let client = Arc::new(client);
        self.connections.insert(name.into(), Arc::clone(&client));
        client
    }

    /// Sets the default connection name.
    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default = name.into();
    }

    /// Default connection name.
    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Gets a connection by name.
    pub fn connection(&self, name: &str) -> MotiveResult<Arc<MotiveClient>> {
        self.connections.get(name).cloned().ok_or_else(|| {
            MotiveError::configuration(format!("Motive connection [{}] is not configured", name))
        })
    }

    /// Gets the default connection.
    pub fn default_connection(&self) -> MotiveResult<Arc<MotiveClient>> {
        self.connection(&self.default)
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// Registered connection names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
