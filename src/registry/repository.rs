//! Repository and tag records
//!
//! Tags are snapshots: every field apart from the name is recomputed by the
//! aggregator on each fetch.

use crate::common::FormatUtils;
use crate::error::ManagerError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub name: String,
    /// Query-escaped form of `name`, safe to embed in links
    pub encoded_uri: String,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let encoded_uri = form_urlencoded::byte_serialize(name.as_bytes()).collect();
        Self { name, encoded_uri }
    }
}

/// Whether a tag's metadata was fully gathered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum TagStatus {
    #[default]
    Ok,
    Degraded(String),
}

impl TagStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, TagStatus::Ok)
    }

    /// Record another failure, keeping earlier reasons
    pub fn degrade(&mut self, err: &ManagerError) {
        *self = match std::mem::take(self) {
            TagStatus::Ok => TagStatus::Degraded(err.to_string()),
            TagStatus::Degraded(reason) => TagStatus::Degraded(format!("{}; {}", reason, err)),
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub updated_time: Option<DateTime<Utc>>,
    /// Unix seconds of `updated_time`, 0 when unknown
    pub updated_time_unix: i64,
    pub time_ago: String,
    pub layers: usize,
    pub size: String,
    pub size_int: u64,
    pub status: TagStatus,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time_ago: FormatUtils::time_ago(None),
            size: FormatUtils::format_bytes(0),
            ..Self::default()
        }
    }

    pub fn set_size(&mut self, bytes: u64) {
        self.size_int = bytes;
        self.size = FormatUtils::format_bytes(bytes);
    }

    pub fn set_updated(&mut self, time: Option<DateTime<Utc>>) {
        self.updated_time = time;
        self.updated_time_unix = time.map(|t| t.timestamp()).unwrap_or(0);
        self.time_ago = FormatUtils::time_ago(time);
    }
}
