//! Tag aggregation
//!
//! For one repository the aggregator lists the tag names, spawns one task per
//! tag, and joins on a result channel by counting expected against received
//! records. Each task fetches its manifest, resolves every layer's blob size
//! concurrently, and reduces the results into a single [`Tag`].
//!
//! A task never fails the batch: whatever goes wrong inside it is logged and
//! recorded in the tag's [`TagStatus`], and the tag is still reported with
//! whatever fields could be computed. The returned order follows completion,
//! not the registry's listing.

use crate::error::{ManagerError, Result};
use crate::image::Image;
use crate::logging::Logger;
use crate::registry::client::RegistryClient;
use crate::registry::directory::Registry;
use crate::registry::operations::{BlobOperations, ManifestOperations, RepositoryOperations};
use crate::registry::repository::{Repository, Tag, TagStatus};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct TagAggregator {
    repositories: RepositoryOperations,
    manifests: ManifestOperations,
    blobs: BlobOperations,
    output: Logger,
}

impl TagAggregator {
    pub fn new(client: &RegistryClient) -> Self {
        Self {
            repositories: client.repositories(),
            manifests: client.manifests(),
            blobs: client.blobs(),
            output: client.logger().clone(),
        }
    }

    /// Every tag of `repository` with its size, layer count and last update.
    ///
    /// Fails only when the tag list itself cannot be fetched; afterwards exactly
    /// one record is returned per listed tag name.
    pub async fn list_tags_with_metadata(
        &self,
        registry: Arc<Registry>,
        repository: &Repository,
    ) -> Result<Vec<Tag>> {
        let names = self.repositories.list_tags(&registry, repository).await?;
        let expected = names.len();
        let repository = Arc::new(repository.clone());

        let (tx, mut rx) = mpsc::unbounded_channel::<Tag>();
        for name in names.iter().cloned() {
            let tx = tx.clone();
            let registry = Arc::clone(&registry);
            let repository = Arc::clone(&repository);
            let manifests = self.manifests.clone();
            let blobs = self.blobs.clone();
            let output = self.output.clone();

            tokio::spawn(async move {
                let tag = Self::collect_tag(&manifests, &blobs, &output, &registry, &repository, name)
                    .await;
                // Only fails if the aggregator stopped listening
                let _ = tx.send(tag);
            });
        }
        drop(tx);

        let mut tags = Vec::with_capacity(expected);
        while tags.len() < expected {
            match rx.recv().await {
                Some(tag) => tags.push(tag),
                // Every sender is gone: the remaining tasks died before reporting
                None => break,
            }
        }

        if tags.len() < expected {
            for name in Self::unreported(&names, &tags) {
                self.output.warning(&format!(
                    "Tag task for {}:{} ended without reporting",
                    repository.name, name
                ));
                let mut tag = Tag::new(name);
                tag.status = TagStatus::Degraded("metadata task aborted".to_string());
                tags.push(tag);
            }
        }

        let degraded = tags.iter().filter(|tag| !tag.status.is_ok()).count();
        if degraded > 0 {
            self.output.warning(&format!(
                "{} of {} tags in {} have incomplete metadata",
                degraded, expected, repository.name
            ));
        }
        self.output.success(&format!(
            "Collected metadata for {} tags in {}",
            tags.len(),
            repository.name
        ));
        Ok(tags)
    }

    async fn collect_tag(
        manifests: &ManifestOperations,
        blobs: &BlobOperations,
        output: &Logger,
        registry: &Registry,
        repository: &Repository,
        name: String,
    ) -> Tag {
        let mut tag = Tag::new(name);

        let mut image = match manifests.fetch_manifest(registry, repository, &tag.name).await {
            Ok(image) => image,
            Err(e) => {
                output.warning(&format!(
                    "Metadata for {}/{}:{} unavailable: {}",
                    registry.name, repository.name, tag.name, e
                ));
                tag.status.degrade(&e);
                return tag;
            }
        };

        for e in Self::resolve_layer_sizes(blobs, registry, repository, &mut image).await {
            output.warning(&format!(
                "Layer size for {}/{}:{} counted as 0: {}",
                registry.name, repository.name, tag.name, e
            ));
            tag.status.degrade(&e);
        }

        tag.set_size(image.total_layer_size());
        tag.layers = image.layer_count();
        tag.set_updated(image.latest_created());
        tag
    }

    /// Resolve every layer size of `image` concurrently.
    ///
    /// A transport failure leaves the layer without a size. A registry that
    /// answered without the blob sets it to 0. Both are returned as errors.
    pub async fn resolve_layer_sizes(
        blobs: &BlobOperations,
        registry: &Registry,
        repository: &Repository,
        image: &mut Image,
    ) -> Vec<ManagerError> {
        let lookups = image
            .fs_layers
            .iter()
            .map(|layer| blobs.resolve_blob_size(registry, repository, &layer.blob_sum));
        let results = join_all(lookups).await;

        let mut errors = Vec::new();
        for (layer, result) in image.fs_layers.iter_mut().zip(results) {
            match result {
                Ok(size) => {
                    layer.set_size(size.bytes);
                    if let Some(reason) = size.unresolved {
                        errors.push(ManagerError::BlobUnavailable {
                            repository: repository.name.clone(),
                            digest: layer.blob_sum.clone(),
                            reason,
                        });
                    }
                }
                Err(e) => errors.push(e),
            }
        }
        errors
    }

    pub fn blobs(&self) -> &BlobOperations {
        &self.blobs
    }

    /// Names dispatched but never reported, respecting duplicates in the listing
    fn unreported(names: &[String], tags: &[Tag]) -> Vec<String> {
        let mut received: HashMap<&str, usize> = HashMap::new();
        for tag in tags {
            *received.entry(tag.name.as_str()).or_default() += 1;
        }

        names
            .iter()
            .filter(|name| match received.get_mut(name.as_str()) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    false
                }
                _ => true,
            })
            .cloned()
            .collect()
    }
}
