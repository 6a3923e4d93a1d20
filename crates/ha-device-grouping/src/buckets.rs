//! Manufacturer/Integration Bucketer
//!
//! Sorts device groups into named buckets for browsing ("Tesla", "Sonos",
//! "Other", ...). The biggest buckets come first and "Other" is always last.

use indexmap::IndexMap;
use tracing::debug;

use crate::grouper::DeviceGroup;
use crate::patterns::PatternLibrary;

/// Bucket for groups no hint could place
pub const OTHER_BUCKET: &str = "Other";

/// Bucket name for one group
///
/// Tried in order: the integration, the manufacturer (group, then registry
/// entry), then brand keywords in the device name and primary entity id.
/// Integration and manufacturer values are canonicalized through the brand
/// table when a keyword matches and are used as given otherwise.
pub fn bucket_name(group: &DeviceGroup, patterns: &PatternLibrary) -> String {
    let canonical = |value: &str| {
        patterns
            .bucket_for(value)
            .unwrap_or(value)
            .to_string()
    };

    if let Some(integration) = non_empty(group.integration.as_deref()) {
        return canonical(integration);
    }

    let manufacturer = non_empty(group.manufacturer.as_deref())
        .or_else(|| non_empty(group.device.as_ref().and_then(|d| d.manufacturer.as_deref())));
    if let Some(manufacturer) = manufacturer {
        return canonical(manufacturer);
    }

    patterns
        .bucket_for(&group.device_name)
        .or_else(|| patterns.bucket_for(&group.primary_id().to_string()))
        .unwrap_or(OTHER_BUCKET)
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Bucket groups by manufacturer or integration
///
/// Buckets are ordered by descending size; equal sizes keep the order in
/// which the bucket was first seen. Groups keep their input order inside a
/// bucket.
pub fn bucket_by_manufacturer(
    groups: Vec<DeviceGroup>,
    patterns: &PatternLibrary,
) -> IndexMap<String, Vec<DeviceGroup>> {
    let mut buckets: IndexMap<String, Vec<DeviceGroup>> = IndexMap::new();
    for group in groups {
        buckets
            .entry(bucket_name(&group, patterns))
            .or_default()
            .push(group);
    }

    sort_buckets(&mut buckets);
    debug!(buckets = buckets.len(), "Bucketed device groups");
    buckets
}

/// Descending size, first appearance on ties, "Other" last
pub fn sort_buckets<T>(buckets: &mut IndexMap<String, Vec<T>>) {
    // IndexMap::sort_by is stable
    buckets.sort_by(|a_name, a, b_name, b| {
        (a_name == OTHER_BUCKET)
            .cmp(&(b_name == OTHER_BUCKET))
            .then_with(|| b.len().cmp(&a.len()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_core::{Attributes, EntityState};
    use ha_registries::DeviceEntry;

    fn group(entity_id: &str, attributes: Attributes, device: Option<DeviceEntry>) -> DeviceGroup {
        DeviceGroup::new(
            entity_id.parse().unwrap(),
            EntityState::new("on", attributes),
            device,
            Vec::new(),
        )
    }

    #[test]
    fn test_bucket_name_precedence() {
        let patterns = PatternLibrary::new().unwrap();

        let by_integration = group(
            "light.desk",
            Attributes::new()
                .with("integration", "unifiprotect")
                .with("manufacturer", "Signify"),
            None,
        );
        assert_eq!(bucket_name(&by_integration, &patterns), "Ubiquiti");

        let by_manufacturer = group(
            "light.desk",
            Attributes::new(),
            Some(DeviceEntry::new("d1").with_manufacturer("Signify Netherlands B.V.")),
        );
        assert_eq!(bucket_name(&by_manufacturer, &patterns), "Philips Hue");

        let verbatim = group("light.desk", Attributes::new().with("manufacturer", "Acme"), None);
        assert_eq!(bucket_name(&verbatim, &patterns), "Acme");

        let by_keyword = group("switch.tesla_wall_connector_status", Attributes::new(), None);
        assert_eq!(bucket_name(&by_keyword, &patterns), "Tesla");

        let by_name = group(
            "switch.garage",
            Attributes::new().with("friendly_name", "Garage Shelly Plug"),
            None,
        );
        assert_eq!(bucket_name(&by_name, &patterns), "Shelly");

        let unknown = group("switch.garage", Attributes::new(), None);
        assert_eq!(bucket_name(&unknown, &patterns), OTHER_BUCKET);
    }

    #[test]
    fn test_registry_integration_beats_manufacturer() {
        let patterns = PatternLibrary::new().unwrap();
        let camera = group(
            "camera.garage",
            Attributes::new(),
            Some(
                DeviceEntry::new("d1")
                    .with_manufacturer("Acme Corp")
                    .with_identifier("unifiprotect", "abc"),
            ),
        );
        assert_eq!(camera.integration.as_deref(), Some("unifiprotect"));
        assert_eq!(bucket_name(&camera, &patterns), "Ubiquiti");
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let patterns = PatternLibrary::new().unwrap();
        let luminaire = group(
            "light.hallway_luminaire",
            Attributes::new().with("friendly_name", "Hallway Luminaire"),
            None,
        );
        assert_eq!(bucket_name(&luminaire, &patterns), OTHER_BUCKET);
    }

    #[test]
    fn test_bucket_ordering() {
        let patterns = PatternLibrary::new().unwrap();
        let mut groups = Vec::new();
        for i in 0..100 {
            groups.push(group(&format!("switch.thing_{i}"), Attributes::new(), None));
        }
        for i in 0..5 {
            groups.push(group(
                &format!("switch.a_{i}"),
                Attributes::new().with("manufacturer", "A"),
                None,
            ));
        }
        for i in 0..9 {
            groups.push(group(
                &format!("switch.b_{i}"),
                Attributes::new().with("manufacturer", "B"),
                None,
            ));
        }

        let buckets = bucket_by_manufacturer(groups, &patterns);
        let order: Vec<(&str, usize)> = buckets.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        assert_eq!(order, vec![("B", 9), ("A", 5), ("Other", 100)]);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let mut buckets: IndexMap<String, Vec<u8>> = IndexMap::new();
        buckets.insert("Other".to_string(), vec![1]);
        buckets.insert("Zeta".to_string(), vec![1, 2]);
        buckets.insert("Alpha".to_string(), vec![1, 2]);
        buckets.insert("Mid".to_string(), vec![1]);

        sort_buckets(&mut buckets);
        let names: Vec<&str> = buckets.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid", "Other"]);
    }
}
