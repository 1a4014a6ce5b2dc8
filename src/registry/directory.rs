//! Registry directory
//!
//! Holds every known registry keyed by host name. Identity fields of a
//! [`Registry`] are fixed at registration; its [`RegistryMetadata`] sits behind a
//! lock owned by that registry alone, so status checks on one registry never
//! contend with another.

use crate::common::FormatUtils;
use crate::error::{ManagerError, Result};
use crate::logging::Logger;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use url::{Host, Url};

pub const API_VERSION: &str = "v2";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryStatus {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl fmt::Display for RegistryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryStatus::Unknown => write!(f, "unknown"),
            RegistryStatus::Available => write!(f, "available"),
            RegistryStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Mutable registry statistics, only touched under the owning registry's lock
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryMetadata {
    pub status: RegistryStatus,
    pub repo_count: usize,
    pub tag_count: usize,
    pub repo_total_size: u64,
    pub repo_total_size_str: String,
}

impl RegistryMetadata {
    pub fn set_total_size(&mut self, bytes: u64) {
        self.repo_total_size = bytes;
        self.repo_total_size_str = FormatUtils::format_bytes(bytes);
    }
}

/// Connection coordinates for one registry plus its lock-guarded metadata
#[derive(Debug)]
pub struct Registry {
    pub name: String,
    /// First resolved address of `name`, empty when resolution failed
    pub ip: String,
    pub scheme: String,
    pub port: u16,
    pub version: String,
    metadata: Mutex<RegistryMetadata>,
}

impl Registry {
    /// Parse `scheme://host:port[/path]` into registry coordinates.
    ///
    /// The port must be written out; default ports are not inferred.
    /// [`Registry::base_url`] gives back the input only for canonical URIs:
    /// host names are lowercased and any path, a bare trailing `/` included,
    /// is dropped.
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |reason: String| ManagerError::InvalidUri {
            uri: uri.to_string(),
            reason,
        };

        let url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(invalid(format!("unsupported scheme '{}'", scheme)));
        }

        let name = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => format!("[{}]", addr),
            _ => return Err(invalid("missing host".to_string())),
        };

        let port = explicit_port(&url, uri)
            .ok_or_else(|| invalid("missing explicit port".to_string()))?;

        Ok(Registry {
            name,
            ip: String::new(),
            scheme: scheme.to_string(),
            port,
            version: API_VERSION.to_string(),
            metadata: Mutex::new(RegistryMetadata::default()),
        })
    }

    /// `scheme://host:port`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.name, self.port)
    }

    /// `scheme://host:port/v2`, the root of every API route
    pub fn api_url(&self) -> String {
        format!("{}/{}", self.base_url(), self.version)
    }

    fn lock_metadata(&self) -> MutexGuard<'_, RegistryMetadata> {
        self.metadata
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Consistent copy of the current metadata
    pub fn metadata(&self) -> RegistryMetadata {
        self.lock_metadata().clone()
    }

    pub fn status(&self) -> RegistryStatus {
        self.lock_metadata().status
    }

    pub fn set_status(&self, status: RegistryStatus) {
        self.lock_metadata().status = status;
    }

    /// Apply `update` to the metadata while holding this registry's lock
    pub fn update_metadata<F>(&self, update: F)
    where
        F: FnOnce(&mut RegistryMetadata),
    {
        let mut metadata = self.lock_metadata();
        update(&mut metadata);
    }
}

fn explicit_port(url: &Url, uri: &str) -> Option<u16> {
    if let Some(port) = url.port() {
        return Some(port);
    }
    // Url::port() hides a port equal to the scheme default, so look at the raw authority
    let authority = uri.split_once("://")?.1.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let (_, port) = host_port.rsplit_once(':')?;
    if port.is_empty() || port.contains(']') {
        return None;
    }
    port.parse().ok()
}

/// Process-wide set of registries keyed by host name
#[derive(Debug, Clone, Default)]
pub struct RegistryDirectory {
    registries: Arc<RwLock<HashMap<String, Arc<Registry>>>>,
}

impl RegistryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Registry>>> {
        self.registries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Registry>>> {
        self.registries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Parse `uri`, resolve the host's address for display, and store the registry.
    ///
    /// Registering a host name again replaces the earlier entry.
    pub async fn register(&self, uri: &str, output: &Logger) -> Result<Arc<Registry>> {
        let mut registry = Registry::parse(uri).map_err(|e| {
            output.error(&e.to_string());
            e
        })?;

        let lookup_host = registry.name.trim_start_matches('[').trim_end_matches(']');
        match tokio::net::lookup_host((lookup_host, registry.port)).await {
            Ok(mut addrs) => {
                if let Some(addr) = addrs.next() {
                    registry.ip = addr.ip().to_string();
                }
            }
            Err(e) => output.warning(&format!(
                "Could not resolve an address for {}: {}",
                registry.name, e
            )),
        }

        let registry = Arc::new(registry);
        let replaced = self
            .write()
            .insert(registry.name.clone(), Arc::clone(&registry));
        if replaced.is_some() {
            output.verbose(&format!("Replaced existing registry entry {}", registry.name));
        }

        output.success(&format!(
            "Registered registry {} ({})",
            registry.api_url(),
            if registry.ip.is_empty() { "address unknown" } else { registry.ip.as_str() }
        ));
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Registry>> {
        self.read().get(name).cloned()
    }

    /// All registries ordered by name
    pub fn list(&self) -> Vec<Arc<Registry>> {
        let mut registries: Vec<_> = self.read().values().cloned().collect();
        registries.sort_by(|a, b| a.name.cmp(&b.name));
        registries
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
