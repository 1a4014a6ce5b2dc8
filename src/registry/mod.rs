//! Registry module for Docker Registry v2 interactions
//!
//! This module holds the registry directory, the HTTP client with its per-concern
//! operations, and the tag aggregator that fans out one task per tag.

pub mod aggregator;
pub mod client;
pub mod directory;
pub mod operations;
pub mod repository;

pub use aggregator::TagAggregator;
pub use client::{RegistryClient, RegistryClientBuilder};
pub use directory::{Registry, RegistryDirectory, RegistryMetadata, RegistryStatus};
pub use repository::{Repository, Tag, TagStatus};
