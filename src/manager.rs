//! Registry manager
//!
//! [`RegistryManager`] owns everything that outlives a single call: the registry
//! directory, the notification store and the shared HTTP client. The hosting
//! process builds one explicitly (usually through [`RegistryManager::initialize`])
//! and hands out references; there is no global state behind it.

use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use crate::events::{ActiveEvents, EventData};
use crate::image::Image;
use crate::logging::Logger;
use crate::registry::aggregator::TagAggregator;
use crate::registry::client::RegistryClient;
use crate::registry::directory::{Registry, RegistryDirectory, RegistryMetadata, RegistryStatus};
use crate::registry::repository::{Repository, Tag};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

/// Result of refreshing one repository during a registry refresh
#[derive(Debug, Clone, Serialize)]
pub struct RepositorySnapshot {
    pub repository: Repository,
    pub tags: Vec<Tag>,
    /// Set when the tag list itself could not be fetched
    pub error: Option<String>,
}

/// Result of refreshing one registry
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub name: String,
    pub api_url: String,
    pub metadata: RegistryMetadata,
    pub repositories: Vec<RepositorySnapshot>,
}

pub struct RegistryManager {
    directory: RegistryDirectory,
    events: ActiveEvents,
    client: RegistryClient,
    aggregator: TagAggregator,
    output: Logger,
}

impl RegistryManager {
    /// Build a manager with an empty directory and event store
    pub fn new(config: &ManagerConfig, output: Logger) -> Result<Self> {
        let client = RegistryClient::from_config(config, output.clone())?;
        let aggregator = TagAggregator::new(&client);

        Ok(Self {
            directory: RegistryDirectory::new(),
            events: ActiveEvents::new(output.clone()),
            client,
            aggregator,
            output,
        })
    }

    /// Build a manager and register every registry listed in the configuration
    pub async fn initialize(config: &ManagerConfig, output: Logger) -> Result<Self> {
        let manager = Self::new(config, output)?;
        for uri in &config.registries {
            manager.add_registry(uri).await?;
        }
        Ok(manager)
    }

    pub fn directory(&self) -> &RegistryDirectory {
        &self.directory
    }

    pub fn events(&self) -> &ActiveEvents {
        &self.events
    }

    pub async fn add_registry(&self, uri: &str) -> Result<Arc<Registry>> {
        self.directory.register(uri, &self.output).await
    }

    pub fn registry(&self, name: &str) -> Result<Arc<Registry>> {
        self.directory
            .get(name)
            .ok_or_else(|| ManagerError::RegistryNotFound(name.to_string()))
    }

    pub async fn check_status(&self, registry: &Registry) -> RegistryStatus {
        self.client.check_status(registry).await
    }

    pub async fn repositories(&self, registry: &Registry) -> Result<Vec<Repository>> {
        self.client.repositories().list_repositories(registry).await
    }

    pub async fn tags(&self, registry: Arc<Registry>, repository: &Repository) -> Result<Vec<Tag>> {
        self.aggregator
            .list_tags_with_metadata(registry, repository)
            .await
    }

    /// Decoded manifest of one tag, layer sizes unresolved
    pub async fn manifest(
        &self,
        registry: &Registry,
        repository: &Repository,
        tag: &str,
    ) -> Result<Image> {
        self.client
            .manifests()
            .fetch_manifest(registry, repository, tag)
            .await
    }

    /// Decoded manifest of one tag with every layer size resolved.
    ///
    /// Layers whose size lookup failed are logged and left without a size.
    pub async fn image(
        &self,
        registry: &Registry,
        repository: &Repository,
        tag: &str,
    ) -> Result<Image> {
        let mut image = self.manifest(registry, repository, tag).await?;
        let errors = TagAggregator::resolve_layer_sizes(
            self.aggregator.blobs(),
            registry,
            repository,
            &mut image,
        )
        .await;
        for e in errors {
            self.output.warning(&format!(
                "Layer size unresolved for {}:{}: {}",
                repository.name, tag, e
            ));
        }
        Ok(image)
    }

    pub async fn delete_tag(
        &self,
        registry: &Registry,
        repository: &Repository,
        tag: &str,
    ) -> Result<String> {
        self.client
            .manifests()
            .delete_tag(registry, repository, tag)
            .await
    }

    pub fn ingest_events(&self, data: EventData) {
        self.events.ingest(data.events);
    }

    pub fn ingest_event_body(&self, body: &[u8]) -> Result<usize> {
        self.events.ingest_json(body)
    }

    /// Re-check status, walk every repository's tags, and store the totals.
    ///
    /// Repositories are aggregated concurrently; one whose tag list fails is
    /// reported with its error and contributes nothing to the totals.
    pub async fn refresh(&self, registry: Arc<Registry>) -> Result<RegistrySnapshot> {
        let status = self.check_status(&registry).await;
        if status != RegistryStatus::Available {
            return Ok(RegistrySnapshot {
                name: registry.name.clone(),
                api_url: registry.api_url(),
                metadata: registry.metadata(),
                repositories: Vec::new(),
            });
        }

        let repositories = self.repositories(&registry).await?;
        let walks = repositories.into_iter().map(|repository| {
            let registry = Arc::clone(&registry);
            async move {
                match self.tags(registry, &repository).await {
                    Ok(tags) => RepositorySnapshot {
                        repository,
                        tags,
                        error: None,
                    },
                    Err(e) => RepositorySnapshot {
                        repository,
                        tags: Vec::new(),
                        error: Some(e.to_string()),
                    },
                }
            }
        });
        let repositories = join_all(walks).await;

        let tag_count: usize = repositories.iter().map(|r| r.tags.len()).sum();
        let total_size: u64 = repositories
            .iter()
            .flat_map(|r| r.tags.iter())
            .map(|tag| tag.size_int)
            .sum();

        registry.update_metadata(|metadata| {
            metadata.tag_count = tag_count;
            metadata.set_total_size(total_size);
        });

        let metadata = registry.metadata();
        self.output.success(&format!(
            "Refreshed {}: {} repositories, {} tags, {}",
            registry.name, metadata.repo_count, metadata.tag_count, metadata.repo_total_size_str
        ));

        Ok(RegistrySnapshot {
            name: registry.name.clone(),
            api_url: registry.api_url(),
            metadata,
            repositories,
        })
    }

    /// Refresh every registered registry concurrently
    pub async fn refresh_all(&self) -> Vec<Result<RegistrySnapshot>> {
        let refreshes = self
            .directory
            .list()
            .into_iter()
            .map(|registry| self.refresh(registry));
        join_all(refreshes).await
    }
}
