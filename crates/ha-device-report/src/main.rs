//! Device report
//!
//! Loads a hub state snapshot (and optionally the device and area
//! registries, room assignments and a grouping config), runs the grouping
//! engine and prints the device cards bucketed by manufacturer.

mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ha_core::EntitySnapshot;
use ha_device_grouping::{assign_rooms, count_unassigned, sort_for_display, DeviceGrouping, RoomAssignments};
use ha_registries::{AreaRegistry, DeviceRegistry};

/// Group hub entities into device cards and bucket them by manufacturer
#[derive(Parser, Debug)]
#[command(name = "device-report")]
#[command(version)]
#[command(about = "Group hub entities into device cards and bucket them by manufacturer")]
struct Args {
    /// Entity states JSON (the hub's /api/states output or an object keyed by entity id)
    #[arg(long)]
    states: PathBuf,

    /// Device registry JSON (core.device_registry storage file or a device list)
    #[arg(long)]
    devices: Option<PathBuf>,

    /// Area registry JSON (core.area_registry storage file or an area list)
    #[arg(long)]
    areas: Option<PathBuf>,

    /// Room assignments JSON, device or entity id to room name
    #[arg(long)]
    rooms: Option<PathBuf>,

    /// Grouping configuration YAML extending the built-in tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep lone sensors without a registry device
    #[arg(long)]
    all: bool,

    /// Print every classification decision before the report
    #[arg(long)]
    trace: bool,

    /// Emit the buckets as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the report itself can be piped
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let output = run(&args)?;
    print!("{output}");
    Ok(())
}

fn run(args: &Args) -> Result<String> {
    let engine = match &args.config {
        Some(path) => DeviceGrouping::load(path)
            .with_context(|| format!("Failed to load grouping config {}", path.display()))?,
        None => DeviceGrouping::new().context("Failed to build grouping engine")?,
    };

    let states = EntitySnapshot::from_json_str(&read(&args.states)?)
        .with_context(|| format!("Failed to parse states {}", args.states.display()))?;
    let devices = args
        .devices
        .as_deref()
        .map(|path| {
            DeviceRegistry::from_json_str(&read(path)?)
                .with_context(|| format!("Failed to parse device registry {}", path.display()))
        })
        .transpose()?;
    let areas = args
        .areas
        .as_deref()
        .map(|path| {
            AreaRegistry::from_json_str(&read(path)?)
                .with_context(|| format!("Failed to parse area registry {}", path.display()))
        })
        .transpose()?;
    let assignments = args
        .rooms
        .as_deref()
        .map(RoomAssignments::load_or_default)
        .unwrap_or_default();

    info!(
        entities = states.len(),
        devices = devices.as_ref().map_or(0, DeviceRegistry::len),
        "Loaded snapshot"
    );

    let mut output = String::new();
    if args.trace {
        let trace = engine.classify_all(&states, devices.as_ref());
        output.push_str(&report::render_trace(&trace));
        output.push('\n');
    }

    let mut groups = engine.group_entities_by_device(&states, devices.as_ref());
    if !args.all {
        groups = engine.filter_displayable(groups);
    }
    assign_rooms(&mut groups, &assignments, areas.as_ref());
    info!(
        groups = groups.len(),
        unassigned = count_unassigned(&groups),
        "Grouped devices"
    );

    let mut buckets = engine.bucket_by_manufacturer(groups);
    for groups in buckets.values_mut() {
        sort_for_display(groups);
    }
    debug!(buckets = buckets.len(), "Rendering report");

    if args.json {
        output.push_str(&report::render_json(&buckets).context("Failed to serialize report")?);
        output.push('\n');
    } else {
        output.push_str(&report::render_text(&buckets));
    }
    Ok(output)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
