//! Camera detection and camera accessory recognition
//!
//! Camera integrations expose a cloud of entities next to the camera itself:
//! per-object detection sensors, resolution channels, IR and status light
//! toggles, chime settings. These helpers recognize them so they can be hidden
//! and grouped under the camera.

use ha_core::attributes::ATTR_DEVICE_CLASS;
use ha_core::{EntityId, EntityState};
use ha_registries::DeviceEntry;

use crate::patterns::{DetectionPattern, PatternLibrary, DETECTION_ATTRIBUTE_KEYS, DETECTION_DEVICE_CLASSES};

/// Name reported when the attribute fallback classified a detection entity
pub const DETECTION_BY_ATTRIBUTES: &str = "detection_attributes";

impl DetectionPattern {
    /// Every clause present must hold; absent clauses are ignored
    pub fn matches(&self, entity_id: &str, device: Option<&DeviceEntry>) -> bool {
        if let Some(re) = &self.entity_id {
            if !re.is_match(entity_id) {
                return false;
            }
        }

        if !self.manufacturers.is_empty() {
            let Some(manufacturer) = device.and_then(|d| d.manufacturer.as_deref()) else {
                return false;
            };
            let manufacturer = manufacturer.to_lowercase();
            if !self
                .manufacturers
                .iter()
                .any(|m| manufacturer.contains(m.as_str()))
            {
                return false;
            }
        }

        if let Some(re) = &self.model {
            match device.and_then(|d| d.model.as_deref()) {
                Some(model) if re.is_match(model) => {}
                _ => return false,
            }
        }

        true
    }
}

impl PatternLibrary {
    /// Whether an entity reports camera detections (person, vehicle, motion...)
    pub fn is_camera_detection_entity(
        &self,
        entity_id: &EntityId,
        entity: &EntityState,
        device: Option<&DeviceEntry>,
    ) -> bool {
        self.detection_match(entity_id, entity, device).is_some()
    }

    /// Name of the detection pattern matching an entity
    ///
    /// Patterns are tried in order and the first match wins. When none
    /// matches, detection attributes decide; a motion/occupancy style device
    /// class only counts when the id or name also points at a camera, so
    /// ordinary motion sensors stay visible.
    pub fn detection_match(
        &self,
        entity_id: &EntityId,
        entity: &EntityState,
        device: Option<&DeviceEntry>,
    ) -> Option<&str> {
        let full_id = entity_id.to_string();
        if let Some(pattern) = self
            .detection_patterns
            .iter()
            .find(|p| p.matches(&full_id, device))
        {
            return Some(&pattern.name);
        }

        let attrs = &entity.attributes;
        if DETECTION_ATTRIBUTE_KEYS.iter().any(|key| attrs.contains_key(key)) {
            return Some(DETECTION_BY_ATTRIBUTES);
        }

        let detection_class = attrs
            .get_str(ATTR_DEVICE_CLASS)
            .is_some_and(|class| DETECTION_DEVICE_CLASSES.contains(&class));
        if detection_class && self.names_camera(entity_id, entity) {
            return Some(DETECTION_BY_ATTRIBUTES);
        }

        None
    }

    fn names_camera(&self, entity_id: &EntityId, entity: &EntityState) -> bool {
        self.camera_name_token.is_match(entity_id.object_id())
            || entity
                .friendly_name()
                .is_some_and(|name| self.camera_name_token.is_match(name))
    }

    /// Whether an entity is a camera accessory (channel, IR light, chime...)
    pub fn is_camera_sub_entity(&self, entity_id: &EntityId) -> bool {
        let object_id = entity_id.object_id();
        self.camera_accessory_patterns
            .iter()
            .any(|re| re.is_match(object_id))
    }

    /// Shared camera identity of an entity, with detection and channel
    /// suffixes removed
    ///
    /// `binary_sensor.front_door_person_detected` and
    /// `camera.front_door_high_resolution` both give `front_door`.
    pub fn camera_base_name(&self, entity_id: &EntityId) -> String {
        self.strip_camera_suffixes(entity_id.object_id())
    }

    pub(crate) fn strip_camera_suffixes(&self, object_id: &str) -> String {
        let mut base = object_id.to_string();
        for suffix in &self.camera_suffixes {
            let stripped = suffix.replace(&base, "");
            if !stripped.is_empty() {
                base = stripped.into_owned();
            }
        }
        base
    }
}

/// Object ids that name a detection entity by convention
pub(crate) fn has_detection_suffix(object_id: &str) -> bool {
    object_id.contains("_detections_") || object_id.contains("_detection_") || object_id.ends_with("_detected")
}
