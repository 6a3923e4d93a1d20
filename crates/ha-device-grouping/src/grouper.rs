//! Device Grouper
//!
//! Turns a flat entity snapshot into device cards: one [`DeviceGroup`] per
//! physical device, with the primary entity first and its sub-entities
//! after it. Every entity lands in at most one group.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument};

use ha_core::attributes::{ATTR_INTEGRATION, ATTR_MANUFACTURER, ATTR_MODEL};
use ha_core::domains::is_sensor_domain;
use ha_core::{EntityId, EntitySnapshot, EntityState};
use ha_registries::{DeviceEntry, DeviceRegistry};

use crate::classifier::EntityClassifier;
use crate::patterns::PatternLibrary;
use crate::relations::{device_for_entity, RelationResolver};

/// A physical device and the entities shown on its card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceGroup {
    /// Registry device id when the device is registered, else the primary
    /// entity id
    pub device_id: String,
    pub device_name: String,
    pub primary_entity: (EntityId, EntityState),
    /// Primary entity first, then related entities in snapshot order
    pub entities: Vec<(EntityId, EntityState)>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub integration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceEntry>,
    pub room: Option<String>,
}

impl DeviceGroup {
    /// Build a group from its primary entity, the registry entry and the
    /// related entities
    pub fn new(
        primary_id: EntityId,
        primary: EntityState,
        device: Option<DeviceEntry>,
        related: impl IntoIterator<Item = (EntityId, EntityState)>,
    ) -> Self {
        let device_id = device
            .as_ref()
            .map(|d| d.id.clone())
            .unwrap_or_else(|| primary_id.to_string());

        let device_name = device
            .as_ref()
            .and_then(DeviceEntry::display_name)
            .or_else(|| primary.friendly_name())
            .map(str::to_string)
            .unwrap_or_else(|| primary_id.humanized());

        let attrs = &primary.attributes;
        let manufacturer = device
            .as_ref()
            .and_then(|d| d.manufacturer.clone())
            .or_else(|| attrs.get_str(ATTR_MANUFACTURER).map(str::to_string));
        let model = device
            .as_ref()
            .and_then(|d| d.model.clone())
            .or_else(|| attrs.get_str(ATTR_MODEL).map(str::to_string));
        let integration = device
            .as_ref()
            .and_then(DeviceEntry::integration)
            .or_else(|| attrs.get_str(ATTR_INTEGRATION))
            .map(str::to_string);

        let primary_entity = (primary_id, primary);
        let mut entities = vec![primary_entity.clone()];
        for (id, state) in related {
            if !entities.iter().any(|(existing, _)| *existing == id) {
                entities.push((id, state));
            }
        }

        Self {
            device_id,
            device_name,
            primary_entity,
            entities,
            manufacturer,
            model,
            integration,
            device,
            room: None,
        }
    }

    pub fn primary_id(&self) -> &EntityId {
        &self.primary_entity.0
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.iter().map(|(id, _)| id)
    }

    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.entities.iter().any(|(id, _)| id == entity_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Groups entities into devices using the classifier and the resolver
#[derive(Debug, Clone, Copy)]
pub struct DeviceGrouper<'a> {
    classifier: EntityClassifier<'a>,
    resolver: RelationResolver<'a>,
}

impl<'a> DeviceGrouper<'a> {
    pub fn new(classifier: EntityClassifier<'a>, resolver: RelationResolver<'a>) -> Self {
        Self {
            classifier,
            resolver,
        }
    }

    /// Group a snapshot into device cards
    ///
    /// Entities are visited in snapshot order. Each unclaimed primary entity
    /// opens a group, unless a group for the same device already exists, and
    /// claims its unclaimed related entities. Groups come out in the order
    /// their primary entity was met.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub fn group_entities_by_device(
        &self,
        entities: &EntitySnapshot,
        devices: Option<&DeviceRegistry>,
    ) -> Vec<DeviceGroup> {
        let mut claimed: HashSet<&EntityId> = HashSet::new();
        let mut seen_devices: HashSet<String> = HashSet::new();
        let mut groups = Vec::new();

        for (entity_id, entity) in entities.iter() {
            if claimed.contains(entity_id) {
                continue;
            }
            if !self
                .classifier
                .is_primary_entity(entity_id, entity, devices, Some(entities))
            {
                continue;
            }

            let device = device_for_entity(entity, devices);
            let key = device
                .map(|d| d.id.clone())
                .unwrap_or_else(|| entity_id.to_string());
            if !seen_devices.insert(key) {
                continue;
            }

            claimed.insert(entity_id);
            let related: Vec<(EntityId, EntityState)> = self
                .resolver
                .related_entities(entity_id, entities)
                .into_iter()
                .filter(|(id, _)| claimed.insert(*id))
                .map(|(id, state)| (id.clone(), state.clone()))
                .collect();

            groups.push(DeviceGroup::new(
                entity_id.clone(),
                entity.clone(),
                device.cloned(),
                related,
            ));
        }

        debug!(
            groups = groups.len(),
            claimed = claimed.len(),
            "Grouped entities by device"
        );
        groups
    }
}

/// Drop groups not worth a device card
///
/// A lone sensor or binary sensor without a registry device is a reading,
/// not a device, unless it names a charger or NAS brand.
pub fn filter_displayable(groups: Vec<DeviceGroup>, patterns: &PatternLibrary) -> Vec<DeviceGroup> {
    let before = groups.len();
    let kept: Vec<DeviceGroup> = groups
        .into_iter()
        .filter(|group| {
            let primary_id = group.primary_id();
            if group.len() > 1 || group.device.is_some() || !is_sensor_domain(primary_id.domain()) {
                return true;
            }
            patterns.has_brand_keyword(&primary_id.to_string(), &group.device_name.to_lowercase())
        })
        .collect();

    debug!(dropped = before - kept.len(), "Filtered displayable groups");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_types::DeviceTypeTable;
    use serde_json::json;

    fn group(entities: &EntitySnapshot, devices: Option<&DeviceRegistry>) -> Vec<DeviceGroup> {
        let patterns = PatternLibrary::new().unwrap();
        let device_types = DeviceTypeTable::new().unwrap();
        let grouper = DeviceGrouper::new(
            EntityClassifier::new(&patterns, &device_types),
            RelationResolver::new(&patterns),
        );
        grouper.group_entities_by_device(entities, devices)
    }

    fn no_related() -> Vec<(EntityId, EntityState)> {
        Vec::new()
    }

    fn ids(group: &DeviceGroup) -> Vec<String> {
        group.entity_ids().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_group_by_registry_device() {
        let devices = DeviceRegistry::from_entries([DeviceEntry::new("d1")
            .with_name("Kitchen Light")
            .with_manufacturer("Signify Netherlands B.V.")
            .with_model("LCA001")]);
        let entities = EntitySnapshot::from_json(json!({
            "light.kitchen": {"state": "on", "attributes": {"device_id": "d1", "friendly_name": "Kitchen"}},
            "sensor.kitchen_power": {"state": "4.2", "attributes": {"device_id": "d1"}}
        }))
        .unwrap();

        let groups = group(&entities, Some(&devices));
        assert_eq!(groups.len(), 1);

        let kitchen = &groups[0];
        assert_eq!(kitchen.device_id, "d1");
        assert_eq!(kitchen.device_name, "Kitchen Light");
        assert_eq!(kitchen.primary_id().to_string(), "light.kitchen");
        assert_eq!(ids(kitchen), vec!["light.kitchen", "sensor.kitchen_power"]);
        assert_eq!(kitchen.manufacturer.as_deref(), Some("Signify Netherlands B.V."));
        assert_eq!(kitchen.model.as_deref(), Some("LCA001"));
        assert!(kitchen.device.is_some());
    }

    #[test]
    fn test_integration_from_registry_identifiers() {
        let devices = DeviceRegistry::from_entries([DeviceEntry::new("d1")
            .with_manufacturer("Acme Corp")
            .with_identifier("unifiprotect", "abc")]);
        let entities = EntitySnapshot::from_json(json!({
            "camera.garage": {"state": "idle", "attributes": {"device_id": "d1", "integration": "generic"}},
            "switch.shed": {"state": "on", "attributes": {"integration": "tplink"}}
        }))
        .unwrap();

        let groups = group(&entities, Some(&devices));
        assert_eq!(groups[0].integration.as_deref(), Some("unifiprotect"));
        assert_eq!(groups[0].manufacturer.as_deref(), Some("Acme Corp"));
        assert_eq!(groups[1].integration.as_deref(), Some("tplink"));
    }

    #[test]
    fn test_group_without_registry() {
        let entities = EntitySnapshot::from_json(json!({
            "switch.pool_pump": {"state": "on", "attributes": {"manufacturer": "Pentair"}},
            "sensor.pool_pump_energy": {"state": "3.1"},
            "light.porch": {"state": "off"}
        }))
        .unwrap();

        let groups = group(&entities, None);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].device_id, "switch.pool_pump");
        assert_eq!(groups[0].device_name, "Pool Pump");
        assert_eq!(groups[0].manufacturer.as_deref(), Some("Pentair"));
        assert_eq!(ids(&groups[0]), vec!["switch.pool_pump", "sensor.pool_pump_energy"]);
        assert_eq!(ids(&groups[1]), vec!["light.porch"]);
    }

    #[test]
    fn test_entities_claimed_once() {
        let entities = EntitySnapshot::from_json(json!({
            "switch.garden": {"state": "on"},
            "switch.garden_lights": {"state": "on"},
            "sensor.garden_lights_power": {"state": "12"}
        }))
        .unwrap();

        let groups = group(&entities, None);
        let mut seen = HashSet::new();
        for group in &groups {
            assert_eq!(group.entities[0].0, group.primary_entity.0);
            for id in group.entity_ids() {
                assert!(seen.insert(id.clone()), "{id} appears in two groups");
            }
        }
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_non_primary_entities_open_no_group() {
        let entities = EntitySnapshot::from_json(json!({
            "automation.morning": {"state": "on"},
            "sensor.hub_rssi": {"state": "-70"}
        }))
        .unwrap();
        assert!(group(&entities, None).is_empty());
    }

    #[test]
    fn test_filter_displayable() {
        let patterns = PatternLibrary::new().unwrap();
        let lone_sensor = DeviceGroup::new(
            "sensor.outdoor_temperature".parse().unwrap(),
            EntityState::new("12", Default::default()),
            None,
            no_related(),
        );
        let nas = DeviceGroup::new(
            "sensor.diskstation_status".parse().unwrap(),
            EntityState::new("normal", Default::default()),
            None,
            no_related(),
        );
        let registered = DeviceGroup::new(
            "binary_sensor.front_door".parse().unwrap(),
            EntityState::new("off", Default::default()),
            Some(DeviceEntry::new("d1")),
            no_related(),
        );
        let light = DeviceGroup::new(
            "light.porch".parse().unwrap(),
            EntityState::new("off", Default::default()),
            None,
            no_related(),
        );

        let kept = filter_displayable(vec![lone_sensor, nas, registered, light], &patterns);
        let primaries: Vec<String> = kept.iter().map(|g| g.primary_id().to_string()).collect();
        assert_eq!(
            primaries,
            vec!["sensor.diskstation_status", "binary_sensor.front_door", "light.porch"]
        );
    }
}
