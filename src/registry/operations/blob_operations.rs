//! Blob operations for registry client
//!
//! Resolves the byte size of a content-addressed blob with a metadata-only
//! request (HEAD /v2/{name}/blobs/{digest}).

use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::error::{ManagerError, Result};
use crate::logging::Logger;
use crate::registry::directory::Registry;
use crate::registry::repository::Repository;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, StatusCode};

/// Outcome of a blob size lookup that reached the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSize {
    pub bytes: u64,
    /// Why the size is unknown; `bytes` is 0 when set
    pub unresolved: Option<String>,
}

#[derive(Clone)]
pub struct BlobOperations {
    client: Client,
    output: Logger,
}

impl BlobOperations {
    pub fn new(client: Client, output: Logger) -> Self {
        Self { client, output }
    }

    /// Size of one blob as declared by the registry's `Content-Length`.
    ///
    /// Transport failures are errors. A non-200 answer resolves to 0 bytes with
    /// the HTTP reason kept in [`BlobSize::unresolved`].
    pub async fn resolve_blob_size(
        &self,
        registry: &Registry,
        repository: &Repository,
        digest: &str,
    ) -> Result<BlobSize> {
        let url = format!("{}/{}/blobs/{}", registry.api_url(), repository.name, digest);

        let response = self.client.head(&url).send().await.map_err(|e| {
            let reason = NetworkErrorHandler::handle_network_error(&e, "blob size lookup");
            self.output.warning(&reason);
            ManagerError::BlobUnavailable {
                repository: repository.name.clone(),
                digest: digest.to_string(),
                reason,
            }
        })?;

        if response.status() != StatusCode::OK {
            let reason =
                HttpErrorHandler::handle_registry_status(response.status(), "blob size lookup");
            self.output
                .warning(&format!("{}; counting blob {} as 0 bytes", reason, digest));
            return Ok(BlobSize {
                bytes: 0,
                unresolved: Some(reason),
            });
        }

        // HEAD bodies are empty, so the declared length has to come from the header itself
        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0);

        self.output
            .detail(&format!("Blob {} in {} is {} bytes", digest, repository.name, size));
        Ok(BlobSize {
            bytes: size,
            unresolved: None,
        })
    }
}
