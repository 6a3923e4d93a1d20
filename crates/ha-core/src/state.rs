//! Entity state snapshot as reported by the hub

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Attributes;

/// The state of one entity at a point in time
///
/// States are supplied externally and treated as immutable; nothing in the
/// grouping engine mutates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// The state value (e.g., "on", "off", "23.5", "unavailable")
    #[serde(default)]
    pub state: String,

    /// Additional attributes associated with the state
    #[serde(default)]
    pub attributes: Attributes,

    /// When the state value last changed
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_changed: Option<DateTime<Utc>>,

    /// When the state was last written, even if the value didn't change
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

/// RFC 3339 timestamp, or `None` when the value is missing or unreadable
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

impl EntityState {
    pub fn new(state: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            state: state.into(),
            attributes,
            last_changed: None,
            last_updated: None,
        }
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.friendly_name()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.attributes.device_id()
    }
}
