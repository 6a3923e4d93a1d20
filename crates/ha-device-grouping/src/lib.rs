//! Entity-to-device grouping for dashboards
//!
//! Takes a flat snapshot of hub entity states plus the optional device
//! registry and decides:
//!
//! - which entities represent a user-facing device (the primary entity)
//! - which entities belong on the same device card
//! - which entities are sub-entities to hide
//! - which manufacturer/integration bucket each device is browsed under
//!
//! Everything here is synchronous and pure. The pattern tables are built
//! once and shared by reference.
//!
//! # Example
//!
//! ```ignore
//! use ha_core::EntitySnapshot;
//! use ha_device_grouping::DeviceGrouping;
//!
//! let engine = DeviceGrouping::new()?;
//! let states = EntitySnapshot::from_json_str(&std::fs::read_to_string("states.json")?)?;
//!
//! let groups = engine.group_entities_by_device(&states, None);
//! for (bucket, groups) in engine.bucket_by_manufacturer(groups) {
//!     println!("{bucket}: {} devices", groups.len());
//! }
//! ```

mod buckets;
mod camera;
mod classifier;
mod config;
mod device_types;
mod error;
mod grouper;
mod patterns;
mod relations;
mod rooms;

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use ha_core::{EntityId, EntitySnapshot, EntityState};
use ha_registries::{DeviceEntry, DeviceRegistry};

pub use buckets::{bucket_by_manufacturer, bucket_name, sort_buckets, OTHER_BUCKET};
pub use camera::DETECTION_BY_ATTRIBUTES;
pub use classifier::{Classification, ClassificationTrace, Decision, EntityClassifier, Rule};
pub use config::{
    BrandBucketConfig, BrandFamilyConfig, DetectionPatternConfig, DeviceTypeConfig, GroupingConfig,
};
pub use device_types::{DeviceType, DeviceTypeTable};
pub use error::{ConfigError, ConfigResult, GroupingError, GroupingResult};
pub use grouper::{filter_displayable, DeviceGroup, DeviceGrouper};
pub use patterns::{contains_keyword, BrandBucket, BrandFamily, DetectionPattern, NamedPattern, PatternLibrary};
pub use relations::{device_for_entity, RelationResolver};
pub use rooms::{assign_rooms, count_unassigned, room_for, sort_for_display, RoomAssignments};

/// The grouping engine: pattern tables plus device types, with every
/// operation as a method
#[derive(Debug, Clone)]
pub struct DeviceGrouping {
    patterns: PatternLibrary,
    device_types: DeviceTypeTable,
}

impl DeviceGrouping {
    /// Engine with the built-in tables
    pub fn new() -> GroupingResult<Self> {
        Self::from_config(&GroupingConfig::default())
    }

    /// Engine with the built-in tables plus configured additions
    pub fn from_config(config: &GroupingConfig) -> GroupingResult<Self> {
        let patterns = PatternLibrary::from_config(config)?;
        let device_types = DeviceTypeTable::from_config(config)?;
        debug!(
            device_types = device_types.len(),
            brand_buckets = patterns.brand_buckets().len(),
            "Built device grouping engine"
        );
        Ok(Self {
            patterns,
            device_types,
        })
    }

    /// Engine configured from a YAML file
    pub fn load(path: impl AsRef<Path>) -> GroupingResult<Self> {
        let config = GroupingConfig::load(path)?;
        Self::from_config(&config)
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    pub fn device_types(&self) -> &DeviceTypeTable {
        &self.device_types
    }

    pub fn classifier(&self) -> EntityClassifier<'_> {
        EntityClassifier::new(&self.patterns, &self.device_types)
    }

    pub fn resolver(&self) -> RelationResolver<'_> {
        RelationResolver::new(&self.patterns)
    }

    pub fn grouper(&self) -> DeviceGrouper<'_> {
        DeviceGrouper::new(self.classifier(), self.resolver())
    }

    pub fn classify(
        &self,
        entity_id: &EntityId,
        entity: &EntityState,
        devices: Option<&DeviceRegistry>,
        all_entities: Option<&EntitySnapshot>,
    ) -> Classification {
        self.classifier()
            .classify(entity_id, entity, devices, all_entities)
    }

    pub fn is_primary_entity(
        &self,
        entity_id: &EntityId,
        entity: &EntityState,
        devices: Option<&DeviceRegistry>,
        all_entities: Option<&EntitySnapshot>,
    ) -> bool {
        self.classify(entity_id, entity, devices, all_entities).primary
    }

    pub fn classify_all(
        &self,
        all_entities: &EntitySnapshot,
        devices: Option<&DeviceRegistry>,
    ) -> ClassificationTrace {
        self.classifier().classify_all(all_entities, devices)
    }

    pub fn related_entities<'s>(
        &self,
        primary_id: &EntityId,
        all_entities: &'s EntitySnapshot,
    ) -> Vec<(&'s EntityId, &'s EntityState)> {
        self.resolver().related_entities(primary_id, all_entities)
    }

    pub fn entities_for_device<'s>(
        &self,
        device_id: &str,
        all_entities: &'s EntitySnapshot,
    ) -> Vec<(&'s EntityId, &'s EntityState)> {
        self.resolver().entities_for_device(device_id, all_entities)
    }

    pub fn device_for_entity<'r>(
        &self,
        entity: &EntityState,
        devices: Option<&'r DeviceRegistry>,
    ) -> Option<&'r DeviceEntry> {
        device_for_entity(entity, devices)
    }

    pub fn is_camera_detection_entity(
        &self,
        entity_id: &EntityId,
        entity: &EntityState,
        device: Option<&DeviceEntry>,
    ) -> bool {
        self.patterns
            .is_camera_detection_entity(entity_id, entity, device)
    }

    pub fn is_camera_sub_entity(&self, entity_id: &EntityId) -> bool {
        self.patterns.is_camera_sub_entity(entity_id)
    }

    pub fn camera_base_name(&self, entity_id: &EntityId) -> String {
        self.patterns.camera_base_name(entity_id)
    }

    pub fn group_entities_by_device(
        &self,
        entities: &EntitySnapshot,
        devices: Option<&DeviceRegistry>,
    ) -> Vec<DeviceGroup> {
        self.grouper().group_entities_by_device(entities, devices)
    }

    pub fn filter_displayable(&self, groups: Vec<DeviceGroup>) -> Vec<DeviceGroup> {
        filter_displayable(groups, &self.patterns)
    }

    pub fn bucket_name(&self, group: &DeviceGroup) -> String {
        bucket_name(group, &self.patterns)
    }

    pub fn bucket_by_manufacturer(
        &self,
        groups: Vec<DeviceGroup>,
    ) -> IndexMap<String, Vec<DeviceGroup>> {
        buckets::bucket_by_manufacturer(groups, &self.patterns)
    }
}
