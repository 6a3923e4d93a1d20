//! End-to-end grouping of captured household snapshots

mod common;

use std::collections::HashSet;

use ha_core::{EntityId, EntitySnapshot};
use ha_device_grouping::{
    assign_rooms, count_unassigned, sort_for_display, DeviceGroup, DeviceGrouping, RoomAssignments,
    Rule,
};
use serde_json::json;

use common::{fixture_path, load_areas, load_devices, load_states};

fn id(s: &str) -> EntityId {
    s.parse().unwrap()
}

fn member_ids(group: &DeviceGroup) -> Vec<String> {
    group.entity_ids().map(|id| id.to_string()).collect()
}

fn primaries(groups: &[DeviceGroup]) -> Vec<String> {
    groups.iter().map(|g| g.primary_id().to_string()).collect()
}

#[test]
fn test_fixture_snapshot_skips_invalid_ids() {
    let states = load_states();
    assert_eq!(states.len(), 19);
    assert!(states.get_str("Invalid Entity").is_none());
    assert!(states
        .get(&id("switch.tesla_wall_connector_status"))
        .unwrap()
        .last_changed
        .is_some());
}

#[test]
fn test_household_grouping() {
    let engine = DeviceGrouping::new().unwrap();
    let states = load_states();
    let devices = load_devices();

    let groups = engine.group_entities_by_device(&states, Some(&devices));
    assert_eq!(
        primaries(&groups),
        vec![
            "switch.tesla_wall_connector_status",
            "light.kitchen",
            "switch.pool_pump",
            "camera.front_door",
            "media_player.living_room",
            "light.hallway",
            "sensor.outdoor_temperature",
            "sensor.diskstation_volume_1_status",
            "light.porch",
        ]
    );

    let camera = &groups[3];
    assert_eq!(camera.device_id, "d_cam");
    assert_eq!(camera.device_name, "Front Door Doorbell");
    assert_eq!(
        member_ids(camera),
        vec![
            "camera.front_door",
            "binary_sensor.front_door_person_detected",
            "switch.front_door_status_light",
        ]
    );

    let speaker = &groups[4];
    assert_eq!(speaker.manufacturer.as_deref(), Some("Sonos"));
    assert_eq!(speaker.integration.as_deref(), Some("sonos"));
    assert_eq!(
        member_ids(speaker),
        vec![
            "media_player.living_room",
            "number.living_room_bass",
            "switch.living_room_loudness",
        ]
    );

    let pool = &groups[2];
    assert_eq!(pool.device_id, "switch.pool_pump");
    assert!(pool.device.is_none());
    assert_eq!(member_ids(pool), vec!["switch.pool_pump", "sensor.pool_pump_energy"]);

    let displayable = engine.filter_displayable(groups);
    assert_eq!(displayable.len(), 8);
    assert!(!primaries(&displayable).contains(&"sensor.outdoor_temperature".to_string()));
}

#[test]
fn test_groups_partition_entities() {
    let engine = DeviceGrouping::new().unwrap();
    let states = load_states();
    let devices = load_devices();

    for registry in [None, Some(&devices)] {
        let groups = engine.group_entities_by_device(&states, registry);
        let mut seen = HashSet::new();
        for group in &groups {
            assert_eq!(&group.entities[0].0, group.primary_id());
            for entity_id in group.entity_ids() {
                assert!(seen.insert(entity_id.clone()), "{entity_id} is in two groups");
            }
        }
    }
}

#[test]
fn test_grouping_is_deterministic() {
    let engine = DeviceGrouping::new().unwrap();
    let states = load_states();
    let devices = load_devices();

    let first = engine.group_entities_by_device(&states, Some(&devices));
    let second = engine.group_entities_by_device(&states, Some(&devices));
    assert_eq!(first, second);

    let first_buckets = engine.bucket_by_manufacturer(first);
    let second_buckets = engine.bucket_by_manufacturer(second);
    assert_eq!(
        first_buckets.keys().collect::<Vec<_>>(),
        second_buckets.keys().collect::<Vec<_>>()
    );
}

#[test]
fn test_tesla_wall_connector_end_to_end() {
    let engine = DeviceGrouping::new().unwrap();
    let states = EntitySnapshot::from_json(json!([
        {"entity_id": "sensor.tesla_wall_connector_power", "state": "7.2"},
        {"entity_id": "switch.tesla_wall_connector_status", "state": "on"}
    ]))
    .unwrap();

    let groups = engine.group_entities_by_device(&states, None);
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].primary_id().to_string(),
        "switch.tesla_wall_connector_status"
    );
    assert_eq!(
        member_ids(&groups[0]),
        vec![
            "switch.tesla_wall_connector_status",
            "sensor.tesla_wall_connector_power"
        ]
    );

    let buckets = engine.bucket_by_manufacturer(groups);
    assert_eq!(buckets.keys().collect::<Vec<_>>(), vec!["Tesla"]);
}

#[test]
fn test_registry_relation() {
    let engine = DeviceGrouping::new().unwrap();
    let states = EntitySnapshot::from_json(json!({
        "light.kitchen": {"state": "on", "attributes": {"device_id": "d1"}},
        "sensor.kitchen_power": {"state": "5", "attributes": {"device_id": "d1"}},
        "sensor.kitchen_temperature": {"state": "21"}
    }))
    .unwrap();

    let related = engine.related_entities(&id("light.kitchen"), &states);
    let related: Vec<String> = related.iter().map(|(id, _)| id.to_string()).collect();
    assert_eq!(related, vec!["sensor.kitchen_power"]);

    let on_device: Vec<String> = engine
        .entities_for_device("d1", &states)
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();
    assert_eq!(on_device, vec!["light.kitchen", "sensor.kitchen_power"]);
}

#[test]
fn test_name_fallback_relation() {
    let engine = DeviceGrouping::new().unwrap();
    let states = EntitySnapshot::from_json(json!({
        "switch.pool_pump": {"state": "on"},
        "sensor.pool_pump_energy": {"state": "3.1"}
    }))
    .unwrap();

    let groups = engine.group_entities_by_device(&states, None);
    assert_eq!(groups.len(), 1);
    assert_eq!(
        member_ids(&groups[0]),
        vec!["switch.pool_pump", "sensor.pool_pump_energy"]
    );
}

#[test]
fn test_household_buckets() {
    let engine = DeviceGrouping::new().unwrap();
    let states = load_states();
    let devices = load_devices();

    let groups = engine.filter_displayable(engine.group_entities_by_device(&states, Some(&devices)));
    let buckets = engine.bucket_by_manufacturer(groups);

    let order: Vec<(&str, usize)> = buckets
        .iter()
        .map(|(name, groups)| (name.as_str(), groups.len()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Philips Hue", 2),
            ("Tesla", 1),
            ("Ubiquiti", 1),
            ("Sonos", 1),
            ("Synology", 1),
            ("Other", 2),
        ]
    );
}

#[test]
fn test_household_rooms() {
    let engine = DeviceGrouping::new().unwrap();
    let states = load_states();
    let devices = load_devices();
    let areas = load_areas();
    let assignments = RoomAssignments::load(fixture_path("rooms.json")).unwrap();

    let mut groups =
        engine.filter_displayable(engine.group_entities_by_device(&states, Some(&devices)));
    assign_rooms(&mut groups, &assignments, Some(&areas));
    assert_eq!(count_unassigned(&groups), 4);

    sort_for_display(&mut groups);
    let cards: Vec<(&str, Option<&str>)> = groups
        .iter()
        .map(|g| (g.device_name.as_str(), g.room.as_deref()))
        .collect();
    assert_eq!(
        cards,
        vec![
            ("DiskStation Volume 1 Status", None),
            ("Front Door Doorbell", None),
            ("Porch", None),
            ("Tesla Wall Connector Status", None),
            ("Hallway Light", Some("Hallway")),
            ("Kitchen Ceiling", Some("Kitchen Island")),
            ("Living Room", Some("Living Room")),
            ("Pool Pump", Some("Garden")),
        ]
    );
}

#[test]
fn test_household_classification_trace() {
    let engine = DeviceGrouping::new().unwrap();
    let states = load_states();
    let devices = load_devices();

    let trace = engine.classify_all(&states, Some(&devices));
    assert_eq!(trace.len(), states.len());

    let rule_of = |entity_id: &str| trace.get(&id(entity_id)).unwrap().rule;
    assert_eq!(rule_of("sensor.tesla_wall_connector_power"), Rule::BrandOverride);
    assert_eq!(rule_of("sun.sun"), Rule::DomainDenylist);
    assert_eq!(rule_of("automation.morning_lights"), Rule::DomainDenylist);
    assert_eq!(rule_of("camera.front_door"), Rule::DeviceType);
    assert_eq!(rule_of("switch.front_door_status_light"), Rule::DeviceType);
    assert_eq!(rule_of("number.living_room_bass"), Rule::DeviceType);
    assert_eq!(rule_of("sensor.diskstation_volume_1_status"), Rule::BrandKeywordRescue);
    assert_eq!(rule_of("light.porch"), Rule::Default);

    // Without the registry the camera's accessories are caught by name
    let unregistered = engine.classify_all(&states, None);
    let decision = unregistered
        .get(&id("binary_sensor.front_door_person_detected"))
        .unwrap();
    assert!(!decision.primary);
    assert_eq!(decision.rule, Rule::CameraAccessory);
}

#[test]
fn test_configured_engine() {
    let engine = DeviceGrouping::load(fixture_path("device_grouping.yaml")).unwrap();
    let states = load_states();
    let devices = load_devices();

    let (energy_id, energy) = states.get_str("sensor.pool_pump_energy").unwrap();
    let classification = engine.classify(energy_id, energy, None, Some(&states));
    assert!(!classification.primary);
    assert_eq!(classification.rule, Rule::SubEntityPattern);

    let (kitchen_id, kitchen) = states.get_str("light.kitchen").unwrap();
    assert_eq!(
        engine
            .classify(kitchen_id, kitchen, Some(&devices), Some(&states))
            .rule,
        Rule::DeviceType
    );

    let groups = engine.group_entities_by_device(&states, Some(&devices));
    let pool = groups
        .iter()
        .find(|g| g.primary_id() == &id("switch.pool_pump"))
        .unwrap();
    assert_eq!(engine.bucket_name(pool), "Pool Gear");
}

#[test]
fn test_engine_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DeviceGrouping>();
    assert_send_sync::<DeviceGroup>();
}
