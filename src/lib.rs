//! Docker Registry Manager Library
//!
//! Builds a refreshable in-memory view of one or more Docker Registry v2
//! endpoints: registries, repositories, tags and per-tag image metadata.
//! [`RegistryManager`] is the entry point; it owns the registry directory, the
//! notification store and the shared HTTP client.

pub mod cli;
pub mod common;
pub mod config;
pub mod error;
pub mod events;
pub mod image;
pub mod logging;
pub mod manager;
pub mod registry;

pub use config::ManagerConfig;
pub use error::{ManagerError, Result};
pub use events::{ActiveEvents, Event, EventData};
pub use image::Image;
pub use logging::Logger;
pub use manager::{RegistryManager, RegistrySnapshot, RepositorySnapshot};
pub use registry::{Registry, RegistryStatus, Repository, Tag, TagStatus};
