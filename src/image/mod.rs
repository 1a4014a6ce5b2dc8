//! Docker image manifest module
//!
//! This module provides the [`Image`] view of a registry manifest for one
//! `(repository, tag)` pair: the ordered layer descriptors and the build history,
//! with every embedded v1 compatibility string decoded into a [`V1Compatibility`].
//!
//! Layer byte sizes are not part of the manifest; they are filled in afterwards
//! by the blob size resolver (see [`crate::registry::operations::BlobOperations`]).

pub mod manifest;

pub use manifest::{ContainerConfig, FsLayer, History, Image, V1Compatibility};
