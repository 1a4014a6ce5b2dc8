//! Repository operations for registry client
//!
//! Implements Docker Registry v2 listing operations:
//! - Repository catalog (GET /v2/_catalog)
//! - Tag listing (GET /v2/{name}/tags/list)

use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{ManagerError, Result};
use crate::logging::Logger;
use crate::registry::directory::Registry;
use crate::registry::repository::Repository;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TagListResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct RepositoryOperations {
    client: Client,
    output: Logger,
}

impl RepositoryOperations {
    pub fn new(client: Client, output: Logger) -> Self {
        Self { client, output }
    }

    /// List every repository in the registry catalog and record the count in its metadata
    pub async fn list_repositories(&self, registry: &Registry) -> Result<Vec<Repository>> {
        let url = format!("{}/_catalog", registry.api_url());
        self.output
            .verbose(&format!("Listing repositories for registry: {}", registry.name));

        let unavailable = |reason: String| ManagerError::CatalogUnavailable {
            registry: registry.name.clone(),
            reason,
        };

        let response = self.client.get(&url).send().await.map_err(|e| {
            let reason = NetworkErrorHandler::handle_network_error(&e, "catalog listing");
            self.output.error(&reason);
            unavailable(reason)
        })?;

        if response.status() != StatusCode::OK {
            let reason =
                HttpErrorHandler::handle_registry_status(response.status(), "catalog listing");
            self.output.error(&reason);
            return Err(unavailable(reason));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| unavailable(format!("Failed to read catalog response: {}", e)))?;

        let catalog: CatalogResponse = serde_json::from_slice(&body).map_err(|e| {
            self.output
                .error(&format!("Unable to decode catalog from {}: {}", registry.name, e));
            ManagerError::decode(format!("catalog of {}", registry.name), &e)
        })?;

        let repositories: Vec<Repository> = catalog
            .repositories
            .unwrap_or_default()
            .into_iter()
            .map(Repository::new)
            .collect();

        registry.update_metadata(|metadata| metadata.repo_count = repositories.len());

        self.output.success(&format!(
            "Found {} repositories in registry {}",
            repositories.len(),
            registry.name
        ));
        Ok(repositories)
    }

    /// List the bare tag names of a repository
    pub async fn list_tags(&self, registry: &Registry, repository: &Repository) -> Result<Vec<String>> {
        let url = format!("{}/{}/tags/list", registry.api_url(), repository.name);
        self.output
            .verbose(&format!("Listing tags for repository: {}", repository.name));

        let unavailable = |reason: String| ManagerError::TagListUnavailable {
            registry: registry.name.clone(),
            repository: repository.name.clone(),
            reason,
        };

        let response = self.client.get(&url).send().await.map_err(|e| {
            let reason = NetworkErrorHandler::handle_network_error(&e, "tag listing");
            self.output.error(&reason);
            unavailable(reason)
        })?;

        if response.status() != StatusCode::OK {
            let reason = HttpErrorHandler::handle_registry_status(response.status(), "tag listing");
            self.output.error(&format!("{} ({})", reason, repository.name));
            return Err(unavailable(reason));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| unavailable(format!("Failed to read tags response: {}", e)))?;

        let tag_list: TagListResponse = serde_json::from_slice(&body).map_err(|e| {
            self.output
                .error(&format!("Unable to decode tag list for {}: {}", repository.name, e));
            ManagerError::decode(format!("tag list of {}", repository.name), &e)
        })?;

        let tags = tag_list.tags.unwrap_or_default();
        self.output.detail(&format!(
            "Found {} tags for repository {}",
            tags.len(),
            repository.name
        ));
        Ok(tags)
    }
}
