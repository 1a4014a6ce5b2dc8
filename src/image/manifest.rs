//! Schema 1 manifest decoding
//!
//! `GET /v2/{name}/manifests/{tag}` returns the layer digests (`fsLayers`) and a
//! `history` array whose entries each carry an escaped JSON document
//! (`v1Compatibility`) with the legacy per-layer metadata. Both levels are decoded
//! here; a history entry that fails to decode is logged and left at its default
//! rather than failing the whole manifest.

use crate::common::{FormatUtils, IdUtils};
use crate::error::{ManagerError, Result};
use crate::logging::Logger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

fn null_to_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decoded manifest for one `(repository, tag)` pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, deserialize_with = "null_to_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub tag: String,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default, deserialize_with = "null_to_default")]
    pub architecture: String,
    /// True iff at least one history entry reports a non-zero size
    #[serde(skip_deserializing)]
    pub contains_v1_size: bool,
    #[serde(default, deserialize_with = "null_to_default")]
    pub history: Vec<History>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub fs_layers: Vec<FsLayer>,
}

/// One layer descriptor; the size is resolved separately through a blob HEAD
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FsLayer {
    #[serde(rename = "blobSum", default)]
    pub blob_sum: String,
    #[serde(skip_deserializing)]
    pub size: Option<u64>,
    #[serde(skip_deserializing)]
    pub size_str: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(
        rename = "v1Compatibility",
        alias = "V1Compatibility",
        default,
        deserialize_with = "null_to_default"
    )]
    pub v1_compatibility_str: String,
    #[serde(skip_deserializing)]
    pub v1_compatibility: V1Compatibility,
}

/// Legacy per-layer metadata carried inside a history entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct V1Compatibility {
    #[serde(default, deserialize_with = "null_to_default")]
    pub id: String,
    #[serde(skip_deserializing)]
    pub id_short: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub parent: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub container: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub container_config: ContainerConfig,
    #[serde(default, deserialize_with = "null_to_default")]
    pub docker_version: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub config: ContainerConfig,
    #[serde(default, deserialize_with = "null_to_default")]
    pub architecture: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub os: String,
    #[serde(rename = "Size", alias = "size", default, deserialize_with = "null_to_default")]
    pub size: i64,
    #[serde(skip_deserializing)]
    pub size_str: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default, deserialize_with = "null_to_default")]
    pub hostname: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub domainname: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub user: String,
    #[serde(default)]
    pub exposed_ports: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub tty: bool,
    #[serde(default, deserialize_with = "null_to_default")]
    pub env: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub cmd: Vec<String>,
    /// First command token with the builder no-op marker removed
    #[serde(skip_deserializing)]
    pub cmd_clean: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub image: String,
    #[serde(default)]
    pub volumes: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub working_dir: String,
    #[serde(default)]
    pub entrypoint: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub on_build: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub labels: HashMap<String, String>,
}

impl Image {
    /// Decode a manifest body and every embedded compatibility string
    pub fn decode(body: &[u8], repository: &str, tag: &str, output: &Logger) -> Result<Self> {
        let mut image: Image = serde_json::from_slice(body).map_err(|e| {
            output.error(&format!(
                "Unable to decode manifest for {}:{}: {}",
                repository, tag, e
            ));
            ManagerError::decode(format!("manifest for {}:{}", repository, tag), &e)
        })?;

        image.decode_history(output);
        Ok(image)
    }

    /// Expand each history entry's escaped JSON into its [`V1Compatibility`] record
    pub fn decode_history(&mut self, output: &Logger) {
        self.contains_v1_size = false;

        for (index, entry) in self.history.iter_mut().enumerate() {
            let mut v1: V1Compatibility = match serde_json::from_str(&entry.v1_compatibility_str) {
                Ok(v1) => v1,
                Err(e) => {
                    output.warning(&format!(
                        "Skipping history entry {} of {}:{}: malformed v1Compatibility: {}",
                        index, self.name, self.tag, e
                    ));
                    entry.v1_compatibility = V1Compatibility::default();
                    continue;
                }
            };

            v1.id_short = IdUtils::short_id(&v1.id);
            v1.size_str = FormatUtils::format_bytes(v1.size.max(0) as u64);
            if v1.size != 0 {
                self.contains_v1_size = true;
            }

            match v1.container_config.cmd.first() {
                Some(command) => v1.container_config.cmd_clean = IdUtils::clean_command(command),
                None => output.detail(&format!(
                    "History entry {} ({}) has no container command",
                    index, v1.id_short
                )),
            }

            entry.v1_compatibility = v1;
        }
    }

    /// Number of layers as reported by the build history
    pub fn layer_count(&self) -> usize {
        self.history.len()
    }

    /// Most recent creation time across all history entries
    pub fn latest_created(&self) -> Option<DateTime<Utc>> {
        self.history
            .iter()
            .filter_map(|entry| entry.v1_compatibility.created)
            .max()
    }

    /// Sum of the resolved layer sizes; unresolved layers count as zero
    pub fn total_layer_size(&self) -> u64 {
        self.fs_layers.iter().filter_map(|layer| layer.size).sum()
    }
}

impl FsLayer {
    pub fn set_size(&mut self, size: u64) {
        self.size = Some(size);
        self.size_str = FormatUtils::format_bytes(size);
    }
}
