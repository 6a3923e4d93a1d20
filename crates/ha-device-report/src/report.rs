//! Text and JSON rendering of bucketed device groups

use std::fmt::Write;

use indexmap::IndexMap;
use serde::Serialize;

use ha_device_grouping::{ClassificationTrace, DeviceGroup};

/// One device card as printed in the JSON report
#[derive(Debug, Serialize)]
pub struct DeviceSummary<'a> {
    pub device_id: &'a str,
    pub name: &'a str,
    pub room: Option<&'a str>,
    pub primary_entity: String,
    pub entities: Vec<String>,
    pub manufacturer: Option<&'a str>,
    pub model: Option<&'a str>,
    pub integration: Option<&'a str>,
}

impl<'a> From<&'a DeviceGroup> for DeviceSummary<'a> {
    fn from(group: &'a DeviceGroup) -> Self {
        Self {
            device_id: &group.device_id,
            name: &group.device_name,
            room: group.room.as_deref(),
            primary_entity: group.primary_id().to_string(),
            entities: group.entity_ids().map(|id| id.to_string()).collect(),
            manufacturer: group.manufacturer.as_deref(),
            model: group.model.as_deref(),
            integration: group.integration.as_deref(),
        }
    }
}

/// Buckets as a JSON object, bucket name to device cards
pub fn render_json(buckets: &IndexMap<String, Vec<DeviceGroup>>) -> serde_json::Result<String> {
    let summaries: IndexMap<&str, Vec<DeviceSummary<'_>>> = buckets
        .iter()
        .map(|(name, groups)| (name.as_str(), groups.iter().map(DeviceSummary::from).collect()))
        .collect();
    serde_json::to_string_pretty(&summaries)
}

/// Buckets as an indented listing
pub fn render_text(buckets: &IndexMap<String, Vec<DeviceGroup>>) -> String {
    let mut out = String::new();
    for (name, groups) in buckets {
        let _ = writeln!(out, "{name} ({})", groups.len());
        for group in groups {
            let room = group.room.as_deref().unwrap_or("-");
            let _ = writeln!(
                out,
                "  {:<40} {:<20} {} [{} entities]",
                group.device_name,
                room,
                group.primary_id(),
                group.len()
            );
        }
    }
    out
}

/// One line per classification decision
pub fn render_trace(trace: &ClassificationTrace) -> String {
    let mut out = String::new();
    for decision in trace.iter() {
        let verdict = if decision.primary { "primary" } else { "hidden" };
        let _ = writeln!(
            out,
            "{:<60} {:<8} {}",
            decision.entity_id.to_string(),
            verdict,
            decision.rule
        );
    }

    let _ = writeln!(out);
    for (rule, count) in trace.rule_counts() {
        let _ = writeln!(out, "{rule:<26} {count}");
    }
    out
}
