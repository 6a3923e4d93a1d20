//! Typed access to an entity's open attribute mapping
//!
//! Hub attributes are an untyped bag: any key may hold a string, number,
//! boolean, list or nested mapping, and any key may be missing. The accessors
//! here collapse "missing" and "wrong type" into `None` so callers never have
//! to distinguish the two.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";
pub const ATTR_DEVICE_ID: &str = "device_id";
pub const ATTR_DEVICE_CLASS: &str = "device_class";
pub const ATTR_UNIT_OF_MEASUREMENT: &str = "unit_of_measurement";
pub const ATTR_SUPPORTED_FEATURES: &str = "supported_features";
pub const ATTR_MANUFACTURER: &str = "manufacturer";
pub const ATTR_MODEL: &str = "model";
pub const ATTR_INTEGRATION: &str = "integration";
pub const ATTR_ENTITY_ID: &str = "entity_id";

/// Attribute mapping of one entity state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Raw value for `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String value for `key`; empty strings count as absent
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn get_list(&self, key: &str) -> Option<&[Value]> {
        self.0.get(key).and_then(Value::as_array).map(Vec::as_slice)
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.get_str(ATTR_FRIENDLY_NAME)
    }

    pub fn device_id(&self) -> Option<&str> {
        self.get_str(ATTR_DEVICE_ID)
    }

    pub fn device_class(&self) -> Option<&str> {
        self.get_str(ATTR_DEVICE_CLASS)
    }

    /// Feature bitmask, `0` when absent or not an integer
    pub fn supported_features(&self) -> u64 {
        self.get_i64(ATTR_SUPPORTED_FEATURES)
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0)
    }

    /// Insert a value, returning self for chaining
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
