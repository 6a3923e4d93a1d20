//! Device-type capability table
//!
//! Maps manufacturer/model patterns to the domains that represent a device of
//! that type. When an entity's device matches an entry, only entities in the
//! declared domains are shown for it.

use regex::Regex;
use tracing::trace;

use ha_registries::DeviceEntry;

use crate::config::{DeviceTypeConfig, GroupingConfig};
use crate::error::GroupingResult;
use crate::patterns::compile;

/// Built-in entries: (name, manufacturer substrings, model regex, primary domains)
static BUILTIN_DEVICE_TYPES: &[(&str, &[&str], Option<&str>, &[&str])] = &[
    ("Sonos speaker", &["sonos"], None, &["media_player"]),
    (
        "UniFi Protect camera",
        &["ubiquiti"],
        Some(r"(?i)^(g[3-6]|uvc|ai )"),
        &["camera"],
    ),
    ("Reolink camera", &["reolink"], None, &["camera"]),
    (
        "Robot vacuum",
        &["roborock", "irobot", "ecovacs", "dreame"],
        None,
        &["vacuum"],
    ),
    ("Thermostat", &["ecobee", "tado", "honeywell"], None, &["climate"]),
    (
        "Smart lock",
        &["august", "yale", "nuki", "schlage"],
        None,
        &["lock"],
    ),
    ("Motorized shade", &["somfy", "hunter douglas"], None, &["cover"]),
    ("Ceiling fan", &[], Some(r"(?i)ceiling fan"), &["fan", "light"]),
];

/// A recognized device type
#[derive(Debug, Clone)]
pub struct DeviceType {
    pub name: String,
    /// Lowercase manufacturer substrings, any of which must match
    pub manufacturers: Vec<String>,
    pub model: Option<Regex>,
    pub primary_domains: Vec<String>,
}

impl DeviceType {
    /// Whether a registry device is of this type
    ///
    /// Every clause present must hold.
    pub fn matches(&self, device: &DeviceEntry) -> bool {
        if !self.manufacturers.is_empty() {
            let Some(manufacturer) = device.manufacturer.as_deref() else {
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
            match device.model.as_deref().or(device.model_id.as_deref()) {
                Some(model) if re.is_match(model) => {}
                _ => return false,
            }
        }

        true
    }

    pub fn is_primary_domain(&self, domain: &str) -> bool {
        self.primary_domains.iter().any(|d| d == domain)
    }
}

/// Ordered table of device types; the first match wins
#[derive(Debug, Clone, Default)]
pub struct DeviceTypeTable {
    types: Vec<DeviceType>,
}

impl DeviceTypeTable {
    /// Table with the built-in entries only
    pub fn new() -> GroupingResult<Self> {
        Self::from_config(&GroupingConfig::default())
    }

    /// Configured entries first, then the built-ins unless replaced
    pub fn from_config(config: &GroupingConfig) -> GroupingResult<Self> {
        let mut types = config
            .device_types
            .iter()
            .map(from_config)
            .collect::<GroupingResult<Vec<_>>>()?;

        if !config.replace_builtin_device_types {
            for (name, manufacturers, model, domains) in BUILTIN_DEVICE_TYPES {
                types.push(DeviceType {
                    name: (*name).to_string(),
                    manufacturers: manufacturers.iter().map(|m| m.to_string()).collect(),
                    model: model.map(|p| compile("device_types", p)).transpose()?,
                    primary_domains: domains.iter().map(|d| d.to_string()).collect(),
                });
            }
        }

        Ok(Self { types })
    }

    /// The device type a registry device matches, if any
    pub fn find(&self, device: &DeviceEntry) -> Option<&DeviceType> {
        let found = self.types.iter().find(|t| t.matches(device));
        if let Some(device_type) = found {
            trace!(device_id = %device.id, device_type = %device_type.name, "Matched device type");
        }
        found
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn from_config(config: &DeviceTypeConfig) -> GroupingResult<DeviceType> {
    Ok(DeviceType {
        name: config.name.clone(),
        manufacturers: config.manufacturers.iter().map(|m| m.to_lowercase()).collect(),
        model: config
            .model
            .as_deref()
            .map(|p| compile("device_types", p))
            .transpose()?,
        primary_domains: config.primary_domains.clone(),
    })
}
