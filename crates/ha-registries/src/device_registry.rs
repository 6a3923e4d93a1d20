//! Device Registry
//!
//! Read-only snapshot of the hub's device registry, indexed by device id.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// A device identifier (namespace, id) pair
///
/// The id can be a string or an integer in JSON, and some integrations send
/// three or more parts; extra parts are joined with `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceIdentifier(pub String, pub String);

impl<'de> Deserialize<'de> for DeviceIdentifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, SeqAccess, Visitor};

        struct IdentifierVisitor;

        impl<'de> Visitor<'de> for IdentifierVisitor {
            type Value = DeviceIdentifier;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a list of [namespace, id, ...]")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let namespace: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;

                let mut parts = Vec::new();
                while let Some(value) = seq.next_element::<Value>()? {
                    match value {
                        Value::String(s) => parts.push(s),
                        Value::Number(n) => parts.push(n.to_string()),
                        _ => return Err(de::Error::custom("id parts must be string or number")),
                    }
                }
                if parts.is_empty() {
                    return Err(de::Error::invalid_length(1, &self));
                }

                Ok(DeviceIdentifier(namespace, parts.join(":")))
            }
        }

        deserializer.deserialize_seq(IdentifierVisitor)
    }
}

impl DeviceIdentifier {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self(namespace.into(), id.into())
    }

    /// Integration namespace (e.g. "sonos", "unifiprotect")
    pub fn namespace(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.1
    }

}

/// A device connection (type, value) pair, e.g. `("mac", "aa:bb:...")`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceConnection(pub String, pub String);

/// A registered device entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,

    /// Unique identifiers by integration (e.g., [["hue", "bridge123"]])
    #[serde(default)]
    pub identifiers: Vec<DeviceIdentifier>,

    /// Connection info (e.g., [["mac", "aa:bb:cc:dd:ee:ff"]])
    #[serde(default)]
    pub connections: Vec<DeviceConnection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// User-set name, preferred over `name` for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_by_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Manufacturer model ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,

    /// Software/firmware version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
}

impl DeviceEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            identifiers: Vec::new(),
            connections: Vec::new(),
            name: None,
            name_by_user: None,
            manufacturer: None,
            model: None,
            model_id: None,
            sw_version: None,
            serial_number: None,
            area_id: None,
        }
    }

    /// Display name (user name, then device name)
    pub fn display_name(&self) -> Option<&str> {
        self.name_by_user
            .as_deref()
            .or(self.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Integration namespace of the first identifier
    pub fn integration(&self) -> Option<&str> {
        self.identifiers.first().map(DeviceIdentifier::namespace)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_area(mut self, area_id: impl Into<String>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    pub fn with_identifier(mut self, namespace: impl Into<String>, id: impl Into<String>) -> Self {
        self.identifiers.push(DeviceIdentifier::new(namespace, id));
        self
    }
}

/// Device registry data in the hub's storage layout
#[derive(Debug, Clone, Default, Deserialize)]
struct DeviceRegistryData {
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct StoredRegistry {
    data: DeviceRegistryData,
}

/// Read-only device registry snapshot, keyed by device id in insertion order
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    by_id: IndexMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of entries
    ///
    /// A later entry with an id already present replaces the earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = DeviceEntry>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.insert(entry);
        }
        registry
    }

    /// Parse the registry from JSON
    ///
    /// Accepts a bare list of devices, `{"devices": [...]}`, or the hub's
    /// storage file layout `{"data": {"devices": [...]}}`.
    pub fn from_json_str(content: &str) -> RegistryResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        let devices = if value.is_array() {
            serde_json::from_value::<Vec<DeviceEntry>>(value)?
        } else if value.get("data").is_some() {
            serde_json::from_value::<StoredRegistry>(value)?.data.devices
        } else if value.get("devices").is_some() {
            serde_json::from_value::<DeviceRegistryData>(value)?.devices
        } else {
            return Err(RegistryError::UnexpectedShape { registry: "device" });
        };

        let registry = Self::from_entries(devices);
        debug!(devices = registry.len(), "Loaded device registry");
        Ok(registry)
    }

    pub fn insert(&mut self, entry: DeviceEntry) {
        self.by_id.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.by_id.get(device_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_with_numeric_and_extra_parts() {
        let id: DeviceIdentifier = serde_json::from_str(r#"["zwave_js", 3245, "17"]"#).unwrap();
        assert_eq!(id.namespace(), "zwave_js");
        assert_eq!(id.id(), "3245:17");

        assert!(serde_json::from_str::<DeviceIdentifier>(r#"["only_namespace"]"#).is_err());
    }

    #[test]
    fn test_display_name_prefers_user_name() {
        let mut entry = DeviceEntry::new("d1").with_name("Living Room Speaker");
        assert_eq!(entry.display_name(), Some("Living Room Speaker"));

        entry.name_by_user = Some("Lounge".to_string());
        assert_eq!(entry.display_name(), Some("Lounge"));

        assert_eq!(DeviceEntry::new("d2").display_name(), None);
    }

    #[test]
    fn test_integration_from_first_identifier() {
        let registry = DeviceRegistry::from_entries([
            DeviceEntry::new("d1")
                .with_identifier("unifiprotect", "abc")
                .with_identifier("mqtt", "cam1"),
            DeviceEntry::new("d2"),
            DeviceEntry::new("d1").with_identifier("sonos", "RINCON_1"),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("d1").and_then(DeviceEntry::integration), Some("sonos"));
        assert_eq!(registry.get("d2").and_then(DeviceEntry::integration), None);
    }

    #[test]
    fn test_from_json_layouts() {
        let list = r#"[{"id": "d1", "name": "Hub", "identifiers": [["hue", "bridge"]],
            "connections": [["mac", "AABBCCDDEEFF"]], "disabled_by": null}]"#;
        let registry = DeviceRegistry::from_json_str(list).unwrap();
        let hub = registry.get("d1").unwrap();
        assert_eq!(hub.integration(), Some("hue"));
        assert_eq!(hub.connections, vec![DeviceConnection("mac".into(), "AABBCCDDEEFF".into())]);

        let stored = r#"{"version": 1, "minor_version": 12, "key": "core.device_registry",
            "data": {"devices": [{"id": "d1"}, {"id": "d2"}], "deleted_devices": []}}"#;
        assert_eq!(DeviceRegistry::from_json_str(stored).unwrap().len(), 2);

        let wrapped = r#"{"devices": [{"id": "d9", "manufacturer": "Sonos"}]}"#;
        assert_eq!(
            DeviceRegistry::from_json_str(wrapped)
                .unwrap()
                .get("d9")
                .and_then(|d| d.manufacturer.as_deref()),
            Some("Sonos")
        );

        assert!(matches!(
            DeviceRegistry::from_json_str("42"),
            Err(RegistryError::UnexpectedShape { .. })
        ));
    }
}
