//! Room assignments
//!
//! Rooms are chosen by the user and persisted outside the hub as a JSON
//! object mapping a device id or entity id to a room name. They are merged
//! into freshly computed groups after every recompute.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ha_registries::AreaRegistry;

use crate::error::{ConfigError, ConfigResult};
use crate::grouper::DeviceGroup;

/// Device id or entity id to room name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomAssignments(IndexMap<String, String>);

impl RoomAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load assignments from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let assignments: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!("Loaded {} room assignments from {:?}", assignments.len(), path);
        Ok(assignments)
    }

    /// Load assignments, starting empty when the file is missing or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No room assignments at {:?}", path);
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring room assignments: {}", e);
            Self::default()
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, room: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), room.into())
    }

    pub fn with(mut self, key: impl Into<String>, room: impl Into<String>) -> Self {
        self.insert(key, room);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Room for one group
///
/// An assignment for the device id wins, then an assignment for any member
/// entity in card order, then the registry area of the device.
pub fn room_for(
    group: &DeviceGroup,
    assignments: &RoomAssignments,
    areas: Option<&AreaRegistry>,
) -> Option<String> {
    if let Some(room) = assignments.get(&group.device_id) {
        return Some(room.to_string());
    }

    if let Some(room) = group
        .entity_ids()
        .find_map(|id| assignments.get(&id.to_string()))
    {
        return Some(room.to_string());
    }

    let area_id = group.device.as_ref()?.area_id.as_deref()?;
    areas?.name_of(area_id).map(str::to_string)
}

/// Set `room` on every group
pub fn assign_rooms(
    groups: &mut [DeviceGroup],
    assignments: &RoomAssignments,
    areas: Option<&AreaRegistry>,
) {
    for group in groups.iter_mut() {
        group.room = room_for(group, assignments, areas);
    }
}

/// Unassigned groups first, then by device name ignoring case
pub fn sort_for_display(groups: &mut [DeviceGroup]) {
    groups.sort_by_cached_key(|group| (group.room.is_some(), group.device_name.to_lowercase()));
}

pub fn count_unassigned(groups: &[DeviceGroup]) -> usize {
    groups.iter().filter(|g| g.room.is_none()).count()
}
