//! Domain vocabulary used when deciding what counts as a physical device
//!
//! The hub's domain space is open-ended; these tables only name the domains
//! the grouping rules care about.

/// Domains that never represent a physical device.
pub static NON_PHYSICAL_DOMAINS: &[&str] = &[
    "scene",
    "automation",
    "script",
    "group",
    "zone",
    "person",
    "sun",
    "weather",
    "event",
    "remote",
];

/// Domains whose entities may be shown as a device card.
pub static PRIMARY_DOMAINS: &[&str] = &[
    "light",
    "switch",
    "climate",
    "media_player",
    "camera",
    "lock",
    "cover",
    "fan",
    "vacuum",
    "sensor",
    "binary_sensor",
];

/// Read-only measurement domains.
///
/// These are exempt from same-device domain dominance and are shown unless
/// they look like a sub-entity.
pub static SENSOR_DOMAINS: &[&str] = &["sensor", "binary_sensor"];

/// Domains that are devices in their own right and are never pulled into
/// another entity's group by name similarity.
pub static INDEPENDENT_DEVICE_DOMAINS: &[&str] = &["camera", "media_player", "climate"];

pub const CAMERA: &str = "camera";
pub const MEDIA_PLAYER: &str = "media_player";
pub const SWITCH: &str = "switch";

pub fn is_non_physical_domain(domain: &str) -> bool {
    NON_PHYSICAL_DOMAINS.contains(&domain)
}

pub fn is_primary_domain(domain: &str) -> bool {
    PRIMARY_DOMAINS.contains(&domain)
}

pub fn is_sensor_domain(domain: &str) -> bool {
    SENSOR_DOMAINS.contains(&domain)
}

pub fn is_independent_device_domain(domain: &str) -> bool {
    INDEPENDENT_DEVICE_DOMAINS.contains(&domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_disjoint() {
        for domain in NON_PHYSICAL_DOMAINS {
            assert!(!is_primary_domain(domain), "{domain} is in both tables");
        }
    }

    #[test]
    fn test_sensor_domains_are_primary() {
        assert!(SENSOR_DOMAINS.iter().all(|d| is_primary_domain(d)));
        assert!(is_sensor_domain("binary_sensor"));
        assert!(!is_sensor_domain("switch"));
    }

    #[test]
    fn test_independent_domains() {
        assert!(is_independent_device_domain("camera"));
        assert!(is_independent_device_domain("climate"));
        assert!(!is_independent_device_domain("sensor"));
        assert!(!is_primary_domain("select"));
        assert!(!is_primary_domain("number"));
    }
}
