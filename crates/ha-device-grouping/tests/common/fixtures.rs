//! Test fixtures and data loading
//!
//! Fixtures are captured hub payloads stored in `tests/fixtures/`.

use std::path::{Path, PathBuf};

use ha_core::EntitySnapshot;
use ha_registries::{AreaRegistry, DeviceRegistry};

/// Path of a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a fixture file as a string
pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture '{}' from {:?}: {}", name, path, e))
}

/// Load a fixture file as JSON
pub fn load_json_fixture(name: &str) -> serde_json::Value {
    let content = load_fixture(name);
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture '{}' as JSON: {}", name, e))
}

/// The household state snapshot
pub fn load_states() -> EntitySnapshot {
    EntitySnapshot::from_json(load_json_fixture("states.json"))
        .unwrap_or_else(|e| panic!("Failed to build snapshot from states.json: {}", e))
}

/// The device registry in storage file layout
pub fn load_devices() -> DeviceRegistry {
    DeviceRegistry::from_json_str(&load_fixture("devices.json"))
        .unwrap_or_else(|e| panic!("Failed to parse devices.json: {}", e))
}

/// The area registry in storage file layout
pub fn load_areas() -> AreaRegistry {
    AreaRegistry::from_json_str(&load_fixture("areas.json"))
        .unwrap_or_else(|e| panic!("Failed to parse areas.json: {}", e))
}
