//! Manifest operations for registry client
//!
//! Implements Docker Registry v2 manifest operations:
//! - Manifest download and decoding (GET /v2/{name}/manifests/{tag})
//! - Digest lookup (HEAD /v2/{name}/manifests/{tag})
//! - Manifest deletion by digest (DELETE /v2/{name}/manifests/{digest})
//!
//! Deletion is two requests with no transaction between them; a push that lands
//! in between can move the tag and the delete then targets the digest read first.

use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{ManagerError, Result};
use crate::image::Image;
use crate::logging::Logger;
use crate::registry::directory::Registry;
use crate::registry::repository::Repository;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};

/// Media type that makes the registry report the digest it deletes by
pub const MANIFEST_V2_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// History-bearing schema 1 manifests
const MANIFEST_V1_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v1+prettyjws, \
     application/vnd.docker.distribution.manifest.v1+json, \
     application/json";

const DIGEST_HEADER: &str = "Docker-Content-Digest";

#[derive(Clone)]
pub struct ManifestOperations {
    client: Client,
    output: Logger,
}

impl ManifestOperations {
    pub fn new(client: Client, output: Logger) -> Self {
        Self { client, output }
    }

    /// Fetch and decode the manifest of one tag.
    ///
    /// Layer sizes are left unresolved; see [`super::BlobOperations`].
    pub async fn fetch_manifest(
        &self,
        registry: &Registry,
        repository: &Repository,
        tag: &str,
    ) -> Result<Image> {
        let url = format!("{}/{}/manifests/{}", registry.api_url(), repository.name, tag);
        self.output
            .verbose(&format!("Pulling manifest for {}:{}", repository.name, tag));

        let unavailable = |reason: String| ManagerError::ManifestUnavailable {
            repository: repository.name.clone(),
            tag: tag.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, MANIFEST_V1_ACCEPT)
            .send()
            .await
            .map_err(|e| {
                let reason = NetworkErrorHandler::handle_network_error(&e, "manifest pull");
                self.output.error(&reason);
                unavailable(reason)
            })?;

        if response.status() != StatusCode::OK {
            let reason = HttpErrorHandler::handle_registry_status(response.status(), "manifest pull");
            self.output
                .error(&format!("{} ({}:{})", reason, repository.name, tag));
            return Err(unavailable(reason));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| unavailable(format!("Failed to read manifest response: {}", e)))?;

        let image = Image::decode(&body, &repository.name, tag, &self.output)?;
        self.output.detail(&format!(
            "Manifest for {}:{} has {} layers and {} history entries",
            repository.name,
            tag,
            image.fs_layers.len(),
            image.history.len()
        ));
        Ok(image)
    }

    /// Look up the content digest a tag currently points at
    pub async fn fetch_digest(
        &self,
        registry: &Registry,
        repository: &Repository,
        tag: &str,
    ) -> Result<String> {
        let url = format!("{}/{}/manifests/{}", registry.api_url(), repository.name, tag);

        let unavailable = |reason: String| ManagerError::DigestUnavailable {
            repository: repository.name.clone(),
            tag: tag.to_string(),
            reason,
        };

        let response = self
            .client
            .head(&url)
            .header(ACCEPT, MANIFEST_V2_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| unavailable(NetworkErrorHandler::handle_network_error(&e, "digest lookup")))?;

        let digest = response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if digest.is_empty() {
            return Err(unavailable(format!(
                "no {} header in response (HTTP {})",
                DIGEST_HEADER,
                response.status()
            )));
        }

        Ok(digest.to_string())
    }

    /// Delete a tag by resolving its digest and deleting the manifest it names.
    ///
    /// Returns the digest that was deleted.
    pub async fn delete_tag(
        &self,
        registry: &Registry,
        repository: &Repository,
        tag: &str,
    ) -> Result<String> {
        let digest = self
            .fetch_digest(registry, repository, tag)
            .await
            .map_err(|e| {
                self.output.error(&format!("Could not delete tag! {}", e));
                e
            })?;

        let url = format!("{}/{}/manifests/{}", registry.api_url(), repository.name, digest);
        self.output.verbose(&format!(
            "Deleting {}:{} by digest {}",
            repository.name, tag, digest
        ));

        let failed = |reason: String| ManagerError::DeleteFailed {
            repository: repository.name.clone(),
            tag: tag.to_string(),
            reason,
        };

        let response = self
            .client
            .delete(&url)
            .header(ACCEPT, MANIFEST_V2_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| {
                let reason = NetworkErrorHandler::handle_network_error(&e, "manifest deletion");
                self.output.error(&format!("Could not delete tag! {}", reason));
                failed(reason)
            })?;

        // Any 2xx succeeds, not only 200: Docker Distribution answers 202 Accepted
        if !response.status().is_success() {
            let reason =
                HttpErrorHandler::handle_registry_status(response.status(), "manifest deletion");
            self.output.error(&format!("Could not delete tag! {}", reason));
            return Err(failed(reason));
        }

        self.output.success(&format!(
            "Deleted {}:{} ({})",
            repository.name, tag, digest
        ));
        Ok(digest)
    }
}
