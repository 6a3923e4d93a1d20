//! Area Registry
//!
//! Read-only snapshot of the areas (rooms) a device can be placed in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// A registered area entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEntry {
    pub id: String,

    /// Area name (e.g., "Living Room")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<String>,
}

impl AreaEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            floor_id: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AreaRegistryData {
    areas: Vec<AreaEntry>,
}

#[derive(Debug, Deserialize)]
struct StoredRegistry {
    data: AreaRegistryData,
}

/// Read-only area registry snapshot
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
    by_id: IndexMap<String, AreaEntry>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = AreaEntry>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.insert(entry);
        }
        registry
    }

    /// Parse the registry from JSON (bare list, `{"areas": [...]}`, or the
    /// storage file layout)
    pub fn from_json_str(content: &str) -> RegistryResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        let areas = if value.is_array() {
            serde_json::from_value::<Vec<AreaEntry>>(value)?
        } else if value.get("data").is_some() {
            serde_json::from_value::<StoredRegistry>(value)?.data.areas
        } else if value.get("areas").is_some() {
            serde_json::from_value::<AreaRegistryData>(value)?.areas
        } else {
            return Err(RegistryError::UnexpectedShape { registry: "area" });
        };

        let registry = Self::from_entries(areas);
        debug!(areas = registry.len(), "Loaded area registry");
        Ok(registry)
    }

    pub fn insert(&mut self, entry: AreaEntry) {
        self.by_id.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, area_id: &str) -> Option<&AreaEntry> {
        self.by_id.get(area_id)
    }

    /// Area display name for an id
    pub fn name_of(&self, area_id: &str) -> Option<&str> {
        self.by_id.get(area_id).map(|area| area.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AreaEntry> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
