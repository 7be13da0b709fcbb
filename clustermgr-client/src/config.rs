//! Client configuration

use hyper::Uri;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Default deadline for blocking management calls
pub const DEFAULT_MANAGEMENT_TIMEOUT: Duration = Duration::from_secs(75);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8091";

pub const ENV_ENDPOINT: &str = "CLUSTERMGR_ENDPOINT";
pub const ENV_MANAGEMENT_TIMEOUT_MS: &str = "CLUSTERMGR_MANAGEMENT_TIMEOUT_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "CLUSTERMGR_CONNECT_TIMEOUT_MS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to start transport runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Blocking calls need a multi-threaded runtime, got {0}")]
    UnsupportedRuntime(String),
}

/// Reject runtimes whose timers and tasks stall while a caller blocks on them
pub fn ensure_multi_thread(handle: &Handle) -> Result<(), ConfigError> {
    match handle.runtime_flavor() {
        RuntimeFlavor::CurrentThread => Err(ConfigError::UnsupportedRuntime("current_thread".to_string())),
        _ => Ok(()),
    }
}

/// Settings for connecting a [`crate::ClusterManager`] to a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Base URI of the management API, e.g. `http://10.0.0.1:8091`
    pub endpoint: String,
    /// Deadline used by blocking calls that do not pass their own
    pub management_timeout: Duration,
    pub connect_timeout: Duration,
    /// Worker threads of the runtime an owned transport starts
    pub worker_threads: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            management_timeout: DEFAULT_MANAGEMENT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            worker_threads: 2,
        }
    }
}

impl ManagerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        ManagerConfig {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `CLUSTERMGR_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ManagerConfig::default();

        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_MANAGEMENT_TIMEOUT_MS) {
            config.management_timeout = parse_millis(ENV_MANAGEMENT_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout = parse_millis(ENV_CONNECT_TIMEOUT_MS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_management_timeout(mut self, timeout: Duration) -> Self {
        self.management_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Check the endpoint is a plain `http://host[:port]` URI
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: reason.to_string(),
        };

        let uri: Uri = self.endpoint.parse().map_err(|e: hyper::http::uri::InvalidUri| invalid(&e.to_string()))?;

        if uri.scheme_str() != Some("http") {
            return Err(invalid("scheme must be http"));
        }
        if uri.host().is_none() {
            return Err(invalid("missing host"));
        }
        if self.worker_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "worker_threads",
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        })
}
