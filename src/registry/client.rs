//! Registry HTTP client
//!
//! `RegistryClient` owns the shared `reqwest::Client` and hands out the
//! per-concern operation structs. The client itself answers the liveness probe
//! (`GET /v2/`), which drives a registry's reachability status.

use crate::config::ManagerConfig;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{ManagerError, Result};
use crate::logging::Logger;
use crate::registry::directory::{Registry, RegistryStatus};
use crate::registry::operations::{BlobOperations, ManifestOperations, RepositoryOperations};
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub struct RegistryClientBuilder {
    skip_tls: bool,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    output: Logger,
}

impl RegistryClientBuilder {
    pub fn new() -> Self {
        Self {
            skip_tls: false,
            timeout: None,
            user_agent: None,
            output: Logger::default(),
        }
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_logger(mut self, output: Logger) -> Self {
        self.output = output;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let mut builder = Client::builder();
        if self.skip_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder.build().map_err(|e| {
            ManagerError::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(RegistryClient {
            client,
            output: self.output,
        })
    }
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    output: Logger,
}

impl RegistryClient {
    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::new()
    }

    pub fn from_config(config: &ManagerConfig, output: Logger) -> Result<Self> {
        Self::builder()
            .with_skip_tls(config.skip_tls)
            .with_timeout(config.timeout)
            .with_user_agent(config.user_agent.clone())
            .with_logger(output)
            .build()
    }

    pub fn repositories(&self) -> RepositoryOperations {
        RepositoryOperations::new(self.client.clone(), self.output.clone())
    }

    pub fn manifests(&self) -> ManifestOperations {
        ManifestOperations::new(self.client.clone(), self.output.clone())
    }

    pub fn blobs(&self) -> BlobOperations {
        BlobOperations::new(self.client.clone(), self.output.clone())
    }

    pub fn logger(&self) -> &Logger {
        &self.output
    }

    /// Probe `GET /v2/` and record the outcome in the registry's metadata.
    ///
    /// Only `200 OK` counts as available; the status is always left as
    /// `available` or `unavailable` when this returns.
    pub async fn check_status(&self, registry: &Registry) -> RegistryStatus {
        let url = format!("{}/", registry.api_url());
        self.output.verbose(&format!("Checking registry status: {}", url));

        let status = match self.client.get(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                self.output
                    .success(&format!("Registry {} is available", registry.name));
                RegistryStatus::Available
            }
            Ok(response) => {
                self.output.warning(&format!(
                    "Registry {} is unavailable: {}",
                    registry.name,
                    HttpErrorHandler::handle_registry_status(response.status(), "status check")
                ));
                RegistryStatus::Unavailable
            }
            Err(e) => {
                self.output.warning(&format!(
                    "Registry {} is unavailable: {}",
                    registry.name,
                    NetworkErrorHandler::handle_network_error(&e, "status check")
                ));
                RegistryStatus::Unavailable
            }
        };

        registry.set_status(status);
        status
    }
}
