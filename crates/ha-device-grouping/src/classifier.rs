//! Entity Classifier
//!
//! Decides whether an entity represents a user-facing device or a
//! sub-entity to hide. The decision is an ordered cascade of named rules;
//! each rule either decides (`Some(primary)`) or defers to the next one.
//! The first rule that decides wins, and the rule's name is reported with
//! the result so tests and the report binary can audit every decision.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use ha_core::attributes::ATTR_ENTITY_ID;
use ha_core::domains::{
    is_non_physical_domain, is_primary_domain, is_sensor_domain, CAMERA, MEDIA_PLAYER, SWITCH,
};
use ha_core::{EntityId, EntitySnapshot, EntityState};
use ha_registries::{DeviceEntry, DeviceRegistry};

use crate::device_types::DeviceTypeTable;
use crate::patterns::PatternLibrary;
use crate::relations::device_for_entity;

/// A classification rule, in cascade order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Fixed-function brand families show only their status entity
    BrandOverride,
    /// Scenes, automations, scripts and other non-physical domains
    DomainDenylist,
    /// The registry device matches a known device type
    DeviceType,
    /// A camera or media player on the same device takes over
    DeviceDominance,
    /// LED, indicator and child lock switches
    SubEntitySwitch,
    /// Domains that never form a device card
    PrimaryDomainAllowlist,
    /// Vehicle-charger and NAS entities are always devices
    BrandKeywordRescue,
    /// Switches that toggle an automation
    AutomationSwitch,
    /// Camera detections and camera accessories
    CameraAccessory,
    /// Generic sub-entity naming conventions
    SubEntityPattern,
    /// Speaker tone controls, camera channels, media proxies and groups
    BrandSubControl,
    Default,
}

impl Rule {
    /// Evaluation order
    pub const CASCADE: [Rule; 12] = [
        Rule::BrandOverride,
        Rule::DomainDenylist,
        Rule::DeviceType,
        Rule::DeviceDominance,
        Rule::SubEntitySwitch,
        Rule::PrimaryDomainAllowlist,
        Rule::BrandKeywordRescue,
        Rule::AutomationSwitch,
        Rule::CameraAccessory,
        Rule::SubEntityPattern,
        Rule::BrandSubControl,
        Rule::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::BrandOverride => "brand_override",
            Rule::DomainDenylist => "domain_denylist",
            Rule::DeviceType => "device_type",
            Rule::DeviceDominance => "device_dominance",
            Rule::SubEntitySwitch => "sub_entity_switch",
            Rule::PrimaryDomainAllowlist => "primary_domain_allowlist",
            Rule::BrandKeywordRescue => "brand_keyword_rescue",
            Rule::AutomationSwitch => "automation_switch",
            Rule::CameraAccessory => "camera_accessory",
            Rule::SubEntityPattern => "sub_entity_pattern",
            Rule::BrandSubControl => "brand_sub_control",
            Rule::Default => "default",
        }
    }

    fn evaluate(self, ctx: &RuleContext<'_>) -> Option<bool> {
        match self {
            Rule::BrandOverride => brand_override(ctx),
            Rule::DomainDenylist => is_non_physical_domain(ctx.domain()).then_some(false),
            Rule::DeviceType => device_type(ctx),
            Rule::DeviceDominance => device_dominance(ctx),
            Rule::SubEntitySwitch => (ctx.entity_id.is_domain(SWITCH)
                && ctx.patterns.is_sub_entity_switch(ctx.object_id()))
            .then_some(false),
            Rule::PrimaryDomainAllowlist => (!is_primary_domain(ctx.domain())).then_some(false),
            Rule::BrandKeywordRescue => (ctx.entity_id.in_domains(&["switch", "sensor", "binary_sensor"])
                && ctx.patterns.has_brand_keyword(&ctx.full_id, &ctx.name_lower))
            .then_some(true),
            Rule::AutomationSwitch => (ctx.entity_id.is_domain(SWITCH)
                && ctx.object_id().contains("automation"))
            .then_some(false),
            Rule::CameraAccessory => (ctx
                .patterns
                .is_camera_detection_entity(ctx.entity_id, ctx.entity, ctx.device)
                || ctx.patterns.is_camera_sub_entity(ctx.entity_id))
            .then_some(false),
            Rule::SubEntityPattern => ctx
                .patterns
                .sub_entity_match(&ctx.full_id, ctx.entity.friendly_name())
                .map(|_| false),
            Rule::BrandSubControl => brand_sub_control(ctx).then_some(false),
            Rule::Default => Some(true),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Everything a rule may look at for one entity
struct RuleContext<'a> {
    entity_id: &'a EntityId,
    entity: &'a EntityState,
    device: Option<&'a DeviceEntry>,
    all_entities: Option<&'a EntitySnapshot>,
    patterns: &'a PatternLibrary,
    device_types: &'a DeviceTypeTable,
    full_id: String,
    name_lower: String,
}

impl RuleContext<'_> {
    fn domain(&self) -> &str {
        self.entity_id.domain()
    }

    fn object_id(&self) -> &str {
        self.entity_id.object_id()
    }
}

fn brand_override(ctx: &RuleContext<'_>) -> Option<bool> {
    let family = ctx.patterns.brand_family(&ctx.full_id, &ctx.name_lower)?;
    Some(ctx.full_id.ends_with(family.status_suffix.as_str()))
}

fn device_type(ctx: &RuleContext<'_>) -> Option<bool> {
    let device_type = ctx.device_types.find(ctx.device?)?;
    Some(device_type.is_primary_domain(ctx.domain()))
}

fn device_dominance(ctx: &RuleContext<'_>) -> Option<bool> {
    if is_sensor_domain(ctx.domain()) {
        return None;
    }
    let device = ctx.device?;
    let all_entities = ctx.all_entities?;

    let mut has_camera = false;
    let mut has_media_player = false;
    for (id, state) in all_entities.for_device(&device.id) {
        if id.is_domain(CAMERA) {
            has_camera = true;
        } else if id.is_domain(MEDIA_PLAYER) && !is_camera_proxy(ctx.patterns, id, state) {
            has_media_player = true;
        }
    }

    if has_camera {
        return (!ctx.entity_id.is_domain(CAMERA)).then_some(false);
    }
    if has_media_player {
        return (!ctx.entity_id.is_domain(MEDIA_PLAYER)).then_some(false);
    }
    None
}

fn is_camera_proxy(patterns: &PatternLibrary, entity_id: &EntityId, entity: &EntityState) -> bool {
    let name_lower = entity
        .friendly_name()
        .map(str::to_lowercase)
        .unwrap_or_default();
    patterns.is_media_proxy(entity_id.object_id(), &name_lower)
}

fn brand_sub_control(ctx: &RuleContext<'_>) -> bool {
    let object_id = ctx.object_id();
    if ctx.patterns.is_brand_sub_control(object_id) {
        return true;
    }

    match ctx.domain() {
        CAMERA => object_id.contains("channel"),
        MEDIA_PLAYER => {
            ctx.patterns.is_media_proxy(object_id, &ctx.name_lower)
                || ctx.patterns.is_media_aggregate(object_id)
                // Group players list their members
                || ctx
                    .entity
                    .attributes
                    .get_list(ATTR_ENTITY_ID)
                    .is_some_and(|members| !members.is_empty())
        }
        _ => false,
    }
}

/// Outcome of classifying one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub primary: bool,
    /// The rule that decided
    pub rule: Rule,
}

/// One entry of a [`ClassificationTrace`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub entity_id: EntityId,
    pub primary: bool,
    pub rule: Rule,
}

/// Every classification decision for a snapshot, in snapshot order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassificationTrace {
    pub decisions: Vec<Decision>,
}

impl ClassificationTrace {
    pub fn get(&self, entity_id: &EntityId) -> Option<&Decision> {
        self.decisions.iter().find(|d| &d.entity_id == entity_id)
    }

    /// Ids of the entities classified as primary
    pub fn primary_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.decisions
            .iter()
            .filter(|d| d.primary)
            .map(|d| &d.entity_id)
    }

    /// Number of decisions made by each rule, in cascade order
    pub fn rule_counts(&self) -> Vec<(Rule, usize)> {
        Rule::CASCADE
            .iter()
            .map(|rule| (*rule, self.decisions.iter().filter(|d| d.rule == *rule).count()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter()
    }
}

/// Runs the rule cascade against entities
#[derive(Debug, Clone, Copy)]
pub struct EntityClassifier<'a> {
    patterns: &'a PatternLibrary,
    device_types: &'a DeviceTypeTable,
}

impl<'a> EntityClassifier<'a> {
    pub fn new(patterns: &'a PatternLibrary, device_types: &'a DeviceTypeTable) -> Self {
        Self {
            patterns,
            device_types,
        }
    }

    /// Classify one entity and report the deciding rule
    ///
    /// Without a registry the device rules never fire. Without the full
    /// snapshot, same-device dominance cannot be checked.
    pub fn classify(
        &self,
        entity_id: &EntityId,
        entity: &EntityState,
        devices: Option<&DeviceRegistry>,
        all_entities: Option<&EntitySnapshot>,
    ) -> Classification {
        let ctx = RuleContext {
            entity_id,
            entity,
            device: device_for_entity(entity, devices),
            all_entities,
            patterns: self.patterns,
            device_types: self.device_types,
            full_id: entity_id.to_string(),
            name_lower: entity
                .friendly_name()
                .map(str::to_lowercase)
                .unwrap_or_default(),
        };

        let (rule, primary) = Rule::CASCADE
            .iter()
            .find_map(|rule| rule.evaluate(&ctx).map(|primary| (*rule, primary)))
            .unwrap_or((Rule::Default, true));

        trace!(entity_id = %entity_id, rule = %rule, primary, "Classified entity");
        Classification { primary, rule }
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

    /// Classify every entity of a snapshot against the snapshot itself
    pub fn classify_all(
        &self,
        all_entities: &EntitySnapshot,
        devices: Option<&DeviceRegistry>,
    ) -> ClassificationTrace {
        let decisions = all_entities
            .iter()
            .map(|(entity_id, entity)| {
                let Classification { primary, rule } =
                    self.classify(entity_id, entity, devices, Some(all_entities));
                Decision {
                    entity_id: entity_id.clone(),
                    primary,
                    rule,
                }
            })
            .collect();
        ClassificationTrace { decisions }
    }
}
