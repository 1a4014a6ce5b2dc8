//! Configuration module for the registry manager

use crate::error::{ManagerError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const ENV_REGISTRIES: &str = "REGISTRY_MANAGER_REGISTRIES";
pub const ENV_SKIP_TLS: &str = "REGISTRY_MANAGER_SKIP_TLS";
pub const ENV_TIMEOUT_SECS: &str = "REGISTRY_MANAGER_TIMEOUT_SECS";
pub const ENV_VERBOSE: &str = "REGISTRY_MANAGER_VERBOSE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Registry URIs registered when the manager starts
    pub registries: Vec<String>,
    pub skip_tls: bool,
    /// Per-request timeout; `None` leaves requests unbounded
    pub timeout: Option<Duration>,
    pub verbose: bool,
    pub user_agent: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            registries: Vec::new(),
            skip_tls: false,
            timeout: None,
            verbose: false,
            user_agent: format!("docker-registry-manager/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from `REGISTRY_MANAGER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ManagerConfig::default();

        if let Some(list) = lookup(ENV_REGISTRIES) {
            config.registries = list
                .split(',')
                .map(str::trim)
                .filter(|uri| !uri.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = lookup(ENV_SKIP_TLS) {
            config.skip_tls = parse_bool(ENV_SKIP_TLS, &value)?;
        }
        if let Some(value) = lookup(ENV_VERBOSE) {
            config.verbose = parse_bool(ENV_VERBOSE, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs = value.trim().parse::<u64>().map_err(|_| {
                ManagerError::Configuration(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT_SECS, value
                ))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_registry(mut self, uri: impl Into<String>) -> Self {
        self.registries.push(uri.into());
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(ManagerError::Configuration(format!(
            "{} must be true or false, got '{}'",
            key, other
        ))),
    }
}
