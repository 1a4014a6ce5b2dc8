//! Registry notification intake
//!
//! Registries can push notification envelopes (`{"events": [...]}`) to a
//! webhook. Each event is upserted into [`ActiveEvents`] by id, so a
//! re-delivered event replaces the earlier copy; nothing is ever removed.

use crate::error::{ManagerError, Result};
use crate::logging::Logger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Envelope posted by the registry notification system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub id: String,
    pub timestamp: String,
    pub action: String,
    pub target: Target,
    pub request: Request,
    pub actor: Actor,
    pub source: Source,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Target {
    pub media_type: String,
    pub size: i64,
    pub digest: String,
    pub length: i64,
    pub repository: String,
    pub url: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    pub id: String,
    pub addr: String,
    pub host: String,
    pub method: String,
    pub useragent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Actor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub addr: String,
    #[serde(rename = "instanceID")]
    pub instance_id: String,
}

/// Process-wide events keyed by event id
#[derive(Debug, Clone, Default)]
pub struct ActiveEvents {
    events: Arc<RwLock<HashMap<String, Event>>>,
    output: Logger,
}

impl ActiveEvents {
    pub fn new(output: Logger) -> Self {
        Self {
            events: Arc::default(),
            output,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Event>> {
        self.events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Event>> {
        self.events
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Upsert every event; the last payload for an id wins
    pub fn ingest<I>(&self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        let mut count = 0;
        for event in events {
            self.output.detail(&format!(
                "Event {} ({} {}:{})",
                event.id, event.action, event.target.repository, event.target.tag
            ));
            // One lock per event: concurrent intakes interleave at event granularity
            self.write().insert(event.id.clone(), event);
            count += 1;
        }
        self.output
            .verbose(&format!("Ingested {} registry events ({} active)", count, self.len()));
    }

    /// Decode a raw webhook body and ingest its events
    pub fn ingest_json(&self, body: &[u8]) -> Result<usize> {
        let data: EventData = serde_json::from_slice(body).map_err(|e| {
            self.output.warning(&format!("Rejected notification body: {}", e));
            ManagerError::decode("notification envelope", &e)
        })?;
        let count = data.events.len();
        self.ingest(data.events);
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Option<Event> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All events ordered by timestamp, then id
    pub fn snapshot(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self.read().values().cloned().collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        events
    }
}
