//! Error types and handlers for registry operations

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ManagerError>;

/// Failures surfaced by the registry core.
///
/// Every variant carries plain strings so a failure can be cloned into a
/// degraded tag record without keeping the underlying transport error alive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    /// Registry URI could not be parsed or lacks an explicit port
    #[error("Invalid registry URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// GET /v2/_catalog failed
    #[error("Catalog unavailable for registry {registry}: {reason}")]
    CatalogUnavailable { registry: String, reason: String },

    /// GET /v2/{name}/tags/list failed
    #[error("Tag list unavailable for {registry}/{repository}: {reason}")]
    TagListUnavailable {
        registry: String,
        repository: String,
        reason: String,
    },

    /// GET /v2/{name}/manifests/{tag} failed
    #[error("Manifest unavailable for {repository}:{tag}: {reason}")]
    ManifestUnavailable {
        repository: String,
        tag: String,
        reason: String,
    },

    /// HEAD /v2/{name}/blobs/{digest} failed or the registry lacks the blob
    #[error("Blob {digest} unavailable in {repository}: {reason}")]
    BlobUnavailable {
        repository: String,
        digest: String,
        reason: String,
    },

    /// Malformed JSON from a registry or a webhook body
    #[error("Failed to decode {context}: {reason}")]
    Decode { context: String, reason: String },

    /// Manifest HEAD returned no Docker-Content-Digest header
    #[error("No digest available for {repository}:{tag}: {reason}")]
    DigestUnavailable {
        repository: String,
        tag: String,
        reason: String,
    },

    /// DELETE /v2/{name}/manifests/{digest} failed
    #[error("Failed to delete {repository}:{tag}: {reason}")]
    DeleteFailed {
        repository: String,
        tag: String,
        reason: String,
    },

    /// Lookup of a registry that was never registered
    #[error("Registry not registered: {0}")]
    RegistryNotFound(String),

    /// Invalid configuration or HTTP client setup
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ManagerError {
    pub fn decode(context: impl Into<String>, err: &serde_json::Error) -> Self {
        ManagerError::Decode {
            context: context.into(),
            reason: err.to_string(),
        }
    }
}
