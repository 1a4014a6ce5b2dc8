//! Registry operations module
//!
//! One struct per Docker Registry v2 concern. Each holds a clone of the shared
//! HTTP client and takes the target [`Registry`](crate::registry::Registry) per call,
//! so a single set of operations serves every registry in the directory.

pub mod blob_operations;
pub mod manifest_operations;
pub mod repository_operations;

pub use blob_operations::{BlobOperations, BlobSize};
pub use manifest_operations::{ManifestOperations, MANIFEST_V2_MEDIA_TYPE};
pub use repository_operations::RepositoryOperations;
