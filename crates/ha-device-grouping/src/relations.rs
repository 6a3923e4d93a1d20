//! Relation Resolver
//!
//! Finds the entities that belong to the same physical device as a primary
//! entity. Registry linkage through the `device_id` attribute is ground
//! truth; name similarity is only a fallback for integrations that do not
//! populate the device registry, and stays anchored on the primary's name
//! prefix so unrelated devices with similar names are not merged.

use ha_core::domains::{self, is_independent_device_domain};
use ha_core::{EntityId, EntitySnapshot, EntityState};
use ha_registries::{DeviceEntry, DeviceRegistry};
use tracing::trace;

use crate::camera::has_detection_suffix;
use crate::patterns::PatternLibrary;

/// The registry entry an entity points at through its `device_id` attribute
pub fn device_for_entity<'r>(
    entity: &EntityState,
    devices: Option<&'r DeviceRegistry>,
) -> Option<&'r DeviceEntry> {
    let device_id = entity.device_id()?;
    devices?.get(device_id)
}

/// Resolves sibling entities of a primary entity
#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'a> {
    patterns: &'a PatternLibrary,
}

impl<'a> RelationResolver<'a> {
    pub fn new(patterns: &'a PatternLibrary) -> Self {
        Self { patterns }
    }

    /// All entities carrying `device_id`, in snapshot order
    pub fn entities_for_device<'s>(
        &self,
        device_id: &str,
        all_entities: &'s EntitySnapshot,
    ) -> Vec<(&'s EntityId, &'s EntityState)> {
        all_entities
            .iter()
            .filter(|(_, state)| state.device_id() == Some(device_id))
            .collect()
    }

    /// Entities belonging to the same device as `primary_id`, excluding it
    ///
    /// Returns an empty list when the primary is not in the snapshot.
    pub fn related_entities<'s>(
        &self,
        primary_id: &EntityId,
        all_entities: &'s EntitySnapshot,
    ) -> Vec<(&'s EntityId, &'s EntityState)> {
        let Some(primary) = all_entities.get(primary_id) else {
            return Vec::new();
        };

        if let Some(device_id) = primary.device_id() {
            return self
                .entities_for_device(device_id, all_entities)
                .into_iter()
                .filter(|(id, _)| *id != primary_id)
                .collect();
        }

        self.related_by_name(primary_id, primary, all_entities)
    }

    /// Name prefix shared by a primary entity and its sub-entities
    ///
    /// A brand family's status suffix is removed first, then camera channel,
    /// package and detection suffixes.
    pub fn base_name(&self, entity_id: &EntityId, entity: &EntityState) -> String {
        let object_id = entity_id.object_id();
        let name_lower = entity
            .friendly_name()
            .map(str::to_lowercase)
            .unwrap_or_default();

        let without_status = self
            .patterns
            .brand_family(&entity_id.to_string(), &name_lower)
            .and_then(|family| object_id.strip_suffix(family.status_suffix.as_str()))
            .filter(|base| !base.is_empty())
            .unwrap_or(object_id);

        self.patterns.strip_camera_suffixes(without_status)
    }

    fn related_by_name<'s>(
        &self,
        primary_id: &EntityId,
        primary: &EntityState,
        all_entities: &'s EntitySnapshot,
    ) -> Vec<(&'s EntityId, &'s EntityState)> {
        let base = self.base_name(primary_id, primary);
        let prefix = format!("{base}_");
        let first_token = base.split('_').next().unwrap_or(&base);
        let first_token_prefix = format!("{first_token}_");
        // Detections named after a camera's location only join that camera
        let match_first_token = primary_id.domain() == domains::CAMERA;

        let related: Vec<_> = all_entities
            .iter()
            .filter(|(id, _)| *id != primary_id)
            // Entities linked to a registry device belong to that device
            .filter(|(_, state)| state.device_id().is_none())
            .filter(|(id, _)| {
                let object_id = id.object_id();
                if object_id == base || object_id.starts_with(&prefix) {
                    return true;
                }
                has_detection_suffix(object_id) && {
                    let candidate_base = self.patterns.strip_camera_suffixes(object_id);
                    candidate_base == base
                        || (match_first_token && object_id.starts_with(&first_token_prefix))
                }
            })
            .filter(|(id, _)| !is_independent_device_domain(id.domain()))
            .collect();

        trace!(
            entity_id = %primary_id,
            base_name = %base,
            related = related.len(),
            "Resolved related entities by name"
        );
        related
    }
}
