//! YAML configuration for extending the built-in tables
//!
//! The built-in pattern tables are a snapshot of the integrations seen so far.
//! A `device_grouping.yaml` file can add patterns, brands and device types
//! without a rebuild:
//!
//! ```yaml
//! sub_entity_patterns:
//!   - "_auto_off_timer$"
//! brand_keywords: [myenergi]
//! brand_buckets:
//!   - name: myenergi
//!     keywords: [myenergi, zappi, eddi]
//! device_types:
//!   - name: Zappi charger
//!     manufacturers: [myenergi]
//!     primary_domains: [sensor]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// A fixed-function device family where exactly one entity is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandFamilyConfig {
    pub name: String,
    /// Substrings of the entity id or lowercase friendly name
    pub tokens: Vec<String>,
    /// Entity id suffix of the one entity that stays visible
    pub status_suffix: String,
}

/// A detection pattern; every clause given must hold for a match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionPatternConfig {
    pub name: String,
    /// Regex tested against the full entity id
    pub entity_id: Option<String>,
    /// Substrings, any of which must occur in the device manufacturer
    pub manufacturers: Vec<String>,
    /// Regex tested against the device model
    pub model: Option<String>,
}

/// A browsing bucket and the keywords that select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandBucketConfig {
    pub name: String,
    pub keywords: Vec<String>,
}

/// A recognized device type and the domains shown for it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceTypeConfig {
    pub name: String,
    /// Substrings, any of which must occur in the device manufacturer
    pub manufacturers: Vec<String>,
    /// Regex tested against the device model
    pub model: Option<String>,
    pub primary_domains: Vec<String>,
}

/// Additions to the built-in tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupingConfig {
    /// Regexes over the full entity id marking sub-entities
    pub sub_entity_patterns: Vec<String>,
    /// Regexes over the friendly name marking sub-entities
    pub name_patterns: Vec<String>,
    /// Regexes over the object id marking camera accessories
    pub camera_accessory_patterns: Vec<String>,
    /// Keywords that always make a switch or sensor primary
    pub brand_keywords: Vec<String>,
    pub brand_families: Vec<BrandFamilyConfig>,
    pub detection_patterns: Vec<DetectionPatternConfig>,
    /// Checked before the built-in buckets
    pub brand_buckets: Vec<BrandBucketConfig>,
    pub device_types: Vec<DeviceTypeConfig>,
    /// Use only `device_types` from this file
    pub replace_builtin_device_types: bool,
}

impl GroupingConfig {
    /// Load and validate a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading grouping configuration: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content, Path::new("<string>"))
    }

    fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        // An empty file deserializes to null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the structural rules serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        for (i, device_type) in self.device_types.iter().enumerate() {
            let key = format!("device_types[{i}]");
            if device_type.name.is_empty() {
                return Err(invalid(&key, "name must not be empty"));
            }
            if device_type.manufacturers.is_empty() && device_type.model.is_none() {
                return Err(invalid(&key, "needs at least one of manufacturers or model"));
            }
            if device_type.primary_domains.is_empty() {
                return Err(invalid(&key, "primary_domains must not be empty"));
            }
        }

        for (i, pattern) in self.detection_patterns.iter().enumerate() {
            if pattern.entity_id.is_none() && pattern.manufacturers.is_empty() && pattern.model.is_none() {
                return Err(invalid(
                    &format!("detection_patterns[{i}]"),
                    "needs at least one of entity_id, manufacturers or model",
                ));
            }
        }

        for (i, family) in self.brand_families.iter().enumerate() {
            if family.tokens.is_empty() || family.status_suffix.is_empty() {
                return Err(invalid(
                    &format!("brand_families[{i}]"),
                    "tokens and status_suffix must not be empty",
                ));
            }
        }

        for (i, bucket) in self.brand_buckets.iter().enumerate() {
            if bucket.name.is_empty() || bucket.keywords.is_empty() {
                return Err(invalid(
                    &format!("brand_buckets[{i}]"),
                    "name and keywords must not be empty",
                ));
            }
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
