//! Insertion-ordered snapshot of every entity state known to the hub
//!
//! The order entities were supplied in is preserved; grouping walks the
//! snapshot front to back, so a stable input order gives stable output.

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{EntityId, EntityState};

/// Result type for snapshot parsing
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while building a snapshot from JSON
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The document is not valid JSON
    #[error("failed to parse entity snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is neither a state list nor a map keyed by entity id
    #[error("entity snapshot must be a list of states or an object keyed by entity_id, got {found}")]
    UnexpectedShape { found: &'static str },
}

/// All entity states, keyed by entity id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySnapshot {
    entities: IndexMap<EntityId, EntityState>,
}

impl EntitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from parsed JSON
    ///
    /// Accepts the hub's state list (`[{"entity_id": ..., "state": ...}]`) or
    /// an object keyed by entity id. Records with an invalid entity id or an
    /// unreadable body are skipped.
    pub fn from_json(value: Value) -> SnapshotResult<Self> {
        let mut snapshot = Self::new();

        match value {
            Value::Array(items) => {
                for item in items {
                    let Some(raw_id) = item.get("entity_id").and_then(Value::as_str) else {
                        warn!("Skipping state record without entity_id");
                        continue;
                    };
                    let raw_id = raw_id.to_string();
                    snapshot.insert_raw(&raw_id, item);
                }
            }
            Value::Object(map) => {
                for (raw_id, item) in map {
                    snapshot.insert_raw(&raw_id, item);
                }
            }
            other => {
                return Err(SnapshotError::UnexpectedShape {
                    found: json_kind(&other),
                })
            }
        }

        debug!(entities = snapshot.len(), "Loaded entity snapshot");
        Ok(snapshot)
    }

    /// Parse a JSON document into a snapshot
    pub fn from_json_str(content: &str) -> SnapshotResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_json(value)
    }

    fn insert_raw(&mut self, raw_id: &str, item: Value) {
        let entity_id = match raw_id.parse::<EntityId>() {
            Ok(id) => id,
            Err(e) => {
                warn!(entity_id = raw_id, error = %e, "Skipping entity with invalid id");
                return;
            }
        };
        match serde_json::from_value::<EntityState>(item) {
            Ok(state) => {
                self.entities.insert(entity_id, state);
            }
            Err(e) => warn!(entity_id = raw_id, error = %e, "Skipping unreadable entity state"),
        }
    }

    /// Insert or replace a state, keeping the original position on replace
    pub fn insert(&mut self, entity_id: EntityId, state: EntityState) -> Option<EntityState> {
        self.entities.insert(entity_id, state)
    }

    /// Builder-style insert
    pub fn with(mut self, entity_id: EntityId, state: EntityState) -> Self {
        self.insert(entity_id, state);
        self
    }

    pub fn get(&self, entity_id: &EntityId) -> Option<&EntityState> {
        self.entities.get(entity_id)
    }

    /// Look up a state by its string id
    pub fn get_str(&self, entity_id: &str) -> Option<(&EntityId, &EntityState)> {
        let id = entity_id.parse::<EntityId>().ok()?;
        self.entities.get_key_value(&id)
    }

    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.entities.contains_key(entity_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &EntityState)> {
        self.entities.iter()
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    /// States whose `device_id` attribute equals `device_id`, in snapshot order
    pub fn for_device<'a>(
        &'a self,
        device_id: &'a str,
    ) -> impl Iterator<Item = (&'a EntityId, &'a EntityState)> + 'a {
        self.entities
            .iter()
            .filter(move |(_, state)| state.device_id() == Some(device_id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<(EntityId, EntityState)> for EntitySnapshot {
    fn from_iter<I: IntoIterator<Item = (EntityId, EntityState)>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
