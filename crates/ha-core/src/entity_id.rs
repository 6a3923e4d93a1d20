//! Entity ID type representing a domain.object_id pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid entity IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity_id must contain exactly one '.' separator")]
    InvalidFormat,

    #[error("domain cannot be empty")]
    EmptyDomain,

    #[error("object_id cannot be empty")]
    EmptyObjectId,

    #[error(
        "domain contains invalid characters (must be lowercase alphanumeric with underscores, cannot start/end with underscore or contain double underscores)"
    )]
    InvalidDomainChars,

    #[error(
        "object_id contains invalid characters (must be lowercase alphanumeric with underscores, cannot start/end with underscore)"
    )]
    InvalidObjectIdChars,
}

/// A hub entity ID (e.g., "light.living_room")
///
/// Entity IDs consist of a domain and an object_id separated by a period.
/// Ordering is lexicographic on the full `domain.object_id` string so that
/// sorted collections of ids read naturally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    /// Create a new EntityId from domain and object_id parts
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, EntityIdError> {
        let domain = domain.into();
        let object_id = object_id.into();

        if domain.is_empty() {
            return Err(EntityIdError::EmptyDomain);
        }
        if object_id.is_empty() {
            return Err(EntityIdError::EmptyObjectId);
        }
        if !Self::is_valid_domain(&domain) {
            return Err(EntityIdError::InvalidDomainChars);
        }
        if !Self::is_valid_object_id(&object_id) {
            return Err(EntityIdError::InvalidObjectIdChars);
        }

        Ok(Self { domain, object_id })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Check whether this entity belongs to `domain`
    pub fn is_domain(&self, domain: &str) -> bool {
        self.domain == domain
    }

    /// Check whether this entity belongs to any of `domains`
    pub fn in_domains(&self, domains: &[&str]) -> bool {
        domains.contains(&self.domain.as_str())
    }

    /// Object id with underscores replaced by spaces and each word capitalized
    ///
    /// `tesla_wall_connector_status` becomes `Tesla Wall Connector Status`.
    pub fn humanized(&self) -> String {
        self.object_id
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lowercase alphanumeric + underscore, cannot start/end with `_`
    fn is_valid_object_id(s: &str) -> bool {
        if s.starts_with('_') || s.ends_with('_') {
            return false;
        }
        s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    /// Same as object_id, plus cannot contain `__`
    fn is_valid_domain(s: &str) -> bool {
        if s.contains("__") {
            return false;
        }
        Self::is_valid_object_id(s)
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((domain, object_id)) if !object_id.contains('.') => Self::new(domain, object_id),
            _ => Err(EntityIdError::InvalidFormat),
        }
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}
