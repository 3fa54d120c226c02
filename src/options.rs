//! Client configuration
//!
//! Options deserialize from the camelCase names used by other WFS clients
//! (`userAgent`, `maxSockets`, `queryStringToAppend`, ...), so a JSON
//! configuration file can be passed straight through.

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Recognized client options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    /// Pin the protocol version and skip negotiation
    pub version: Option<String>,
    /// `User-Agent` header
    pub user_agent: Option<String>,
    /// Per-request timeout in seconds
    pub timeout: Option<f64>,
    /// Idle connections kept per host
    pub max_sockets: Option<usize>,
    /// Keep connections alive between requests
    pub keep_alive: Option<bool>,
    /// Extra parameters merged into every request
    pub query_string_to_append: IndexMap<String, String>,
}

impl ClientOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Pin the protocol version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the per-request timeout in seconds
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Set the connection pool size hint
    pub fn with_max_sockets(mut self, max_sockets: usize) -> Self {
        self.max_sockets = Some(max_sockets);
        self
    }

    /// Enable or disable keep-alive
    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// Add a default query parameter
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_to_append.insert(key.into(), value.into());
        self
    }

    /// Timeout as a duration, if configured
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Check option values
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout {
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err(Error::Config(format!(
                    "Timeout must be a positive number of seconds, got {}",
                    timeout
                )));
            }
        }
        if self.max_sockets == Some(0) {
            return Err(Error::Config("maxSockets must be at least 1".to_string()));
        }
        Ok(())
    }
}
