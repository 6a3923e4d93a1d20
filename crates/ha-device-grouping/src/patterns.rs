//! Pattern Library
//!
//! Compiled naming conventions used to tell user-facing entities apart from
//! the sub-entities integrations expose alongside them. The library is built
//! once and shared by reference; nothing in it changes after construction.
//!
//! Patterns fall into a few tables:
//! - sub-entity patterns over the full entity id (`switch.cam_overlay_show_name`)
//! - name patterns over the friendly name (`"Overlay: Show Name"`)
//! - camera detection and camera accessory patterns (see `camera.rs`)
//! - brand families, brand keywords and browsing buckets

use regex::Regex;

use crate::config::{BrandBucketConfig, BrandFamilyConfig, DetectionPatternConfig, GroupingConfig};
use crate::error::{GroupingError, GroupingResult};

/// Sub-entity patterns over the full entity id: (name, regex)
static SUB_ENTITY_PATTERNS: &[(&str, &str)] = &[
    ("overlay", r"_overlay(_|$)|_show_(timestamp|logo|name|date|time|text|watermark|clock)$"),
    ("privacy_mode", r"_privacy(_mode)?$"),
    ("system_sounds", r"_(system|status|startup)_sounds?$"),
    (
        "diagnostic",
        r"_(rssi|signal_strength|wifi_signal|link_quality|linkquality|last_seen|update_available|uptime|last_restart|last_boot)$",
    ),
    (
        "media_control",
        r"^(number|select|switch)\.[a-z0-9_]+_(volume|bass|treble|balance|audio_delay|surround_level|music_surround_level|subwoofer_gain)$",
    ),
    (
        "device_info",
        r"_(firmware|firmware_version|sw_version|software_version|ip|ip_address|mac|mac_address|hostname|ssid)$",
    ),
    (
        "climate_attribute",
        r"^(sensor|select|number|switch)\.[a-z0-9_]+_(hvac_action|hvac_mode|fan_mode|swing_mode|preset_mode|target_temperature(_high|_low)?|eco_mode)$",
    ),
    (
        "light_attribute",
        r"^(sensor|select|number|switch)\.[a-z0-9_]+_(brightness|color_temp|color_temperature|effect|transition|power_on_behavior|power_on_state|startup_behavior)$",
    ),
    (
        "connectivity",
        r"^binary_sensor\.[a-z0-9_]+_(connectivity|connected|connection|reachable|updating|online|cloud_connection)$",
    ),
];

/// Sub-entity patterns over the friendly name
static NAME_PATTERNS: &[&str] = &[
    r"(?i)overlay:",
    r"(?i)privacy mode",
    r"(?i)firmware version",
    r"(?i)^(enable|disable|toggle)\s",
];

/// Switch object ids that control an indicator or lock-out, not the load
static SUB_ENTITY_SWITCH: &str =
    r"(^|_)(led|leds|status_led|indicator|indicator_light|child_lock|childlock)(_|$)";

/// Speaker tone and mode controls exposed as separate entities
static BRAND_SUB_CONTROLS: &str =
    r"_(crossfade|loudness|night_sound|night_mode|speech_enhancement|dialog_mode|surround_enabled|subwoofer_enabled)$";

/// Media players that are really a camera or doorbell feed
static MEDIA_PROXY: &str = r"(camera|doorbell)";

/// Media players that aggregate several speakers
static MEDIA_AGGREGATE: &str =
    r"(^|_)(group|zone|all_speakers|everywhere|whole_house|whole_home|multiroom)(_|$)";

/// Camera accessory entities, over the object id
pub(crate) static CAMERA_ACCESSORY_PATTERNS: &[&str] = &[
    r"_(high|medium|low)_resolution(_channel)?$",
    r"_(channel|stream)_?\d+$",
    r"_package(_camera)?$",
    r"_(ir|infrared)_(mode|light|lights|led)$",
    r"_status_light$",
    r"_(hdr|wdr)(_mode)?$",
    r"_(recording|record)_(mode|enabled)$",
    r"_(microphone|mic)(_level|_sensitivity|_volume)?$",
    r"_(chime_type|chime_duration|chime_volume|doorbell_volume)$",
    r"_(person|vehicle|animal|package|face|license_plate|motion|audio)_detection$",
    r"_(smart_detection|motion_detection|motion_sensitivity|zoom_level|snapshot)$",
    r"_detection_zone(_\d+)?$|_zone_\d+_detection$",
];

/// Ordered suffixes stripped to recover a camera's shared base name
pub(crate) static CAMERA_SUFFIXES: &[&str] = &[
    r"_detections?_[a-z0-9_]+$",
    r"_(person|vehicle|animal|package|face|license_plate|motion|audio|smoke|visitor)_detected$",
    r"_detected$",
    r"_motion$",
    r"_channel_?\d+$",
    r"_(high|medium|low)_resolution$",
    r"_package$",
];

/// Detection patterns: (name, entity id regex, manufacturer substrings, model regex)
pub(crate) static DETECTION_PATTERNS: &[(&str, Option<&str>, &[&str], Option<&str>)] = &[
    (
        "smart_detection",
        Some(r"_(person|vehicle|animal|package|face|license_plate|motion|audio|smoke|co_alarm|glass_break|baby_cry|bark|siren|speaking|visitor)_detected$"),
        &[],
        None,
    ),
    ("detections", Some(r"_detections?_[a-z0-9_]+$"), &[], None),
    (
        "reolink_ai",
        Some(r"_(person|vehicle|pet|animal|face|package|visitor|motion)$"),
        &["reolink"],
        None,
    ),
    (
        "protect_motion",
        Some(r"^binary_sensor\.[a-z0-9_]+_motion$"),
        &["ubiquiti", "ui.com"],
        Some(r"(?i)^(g[3-6]|uvc|ai )"),
    ),
    (
        "nest_events",
        Some(r"_(person|motion|sound|chime)$"),
        &["google", "nest"],
        Some(r"(?i)(cam|doorbell)"),
    ),
    (
        "frigate_objects",
        Some(r"_(person|car|dog|cat|bird|bicycle|motorcycle)_(occupancy|count|active_count)$"),
        &["frigate"],
        None,
    ),
    ("doorbell_press", Some(r"_(ding|ring|doorbell|visitor)$"), &[], Some(r"(?i)doorbell")),
];

/// Attribute keys that only detection entities carry
pub(crate) static DETECTION_ATTRIBUTE_KEYS: &[&str] = &[
    "detection_type",
    "detection_types",
    "event_type",
    "event_types",
    "detections",
    "smart_detect_types",
];

/// Device classes shared by cameras and standalone sensors
pub(crate) static DETECTION_DEVICE_CLASSES: &[&str] =
    &["motion", "occupancy", "sound", "presence", "vibration"];

/// Tokens in an id or name that point at a camera
pub(crate) static CAMERA_NAME_TOKEN: &str =
    r"(?i)(camera|doorbell|protect|(^|[\s_.-])cam($|[\s_-])|(^|[\s_.-])g[3-6]($|[\s_-]))";

/// Vehicle-charger and NAS brands that are always physical devices
static BRAND_KEYWORDS: &[&str] = &[
    "wall_connector",
    "wall connector",
    "tesla",
    "easee",
    "zaptec",
    "wallbox",
    "chargepoint",
    "juicebox",
    "ohme",
    "synology",
    "diskstation",
    "qnap",
    "truenas",
    "unraid",
    "asustor",
];

/// Fixed-function families: (name, tokens, status suffix)
static BRAND_FAMILIES: &[(&str, &[&str], &str)] = &[(
    "Tesla Wall Connector",
    &["tesla_wall_connector", "wall_connector", "wall connector"],
    "_status",
)];

/// Browsing buckets, checked in order
static BRAND_BUCKETS: &[(&str, &[&str])] = &[
    ("Tesla", &["tesla", "wall_connector", "wall connector", "powerwall"]),
    ("Synology", &["synology", "diskstation"]),
    ("QNAP", &["qnap"]),
    ("Ubiquiti", &["unifi", "ubiquiti", "unifiprotect"]),
    ("Sonos", &["sonos"]),
    ("Philips Hue", &["philips", "signify", "hue"]),
    ("Reolink", &["reolink"]),
    ("Google Nest", &["nest", "google"]),
    ("Ecobee", &["ecobee"]),
    ("Roborock", &["roborock"]),
    ("iRobot", &["irobot", "roomba"]),
    ("Ecovacs", &["ecovacs", "deebot"]),
    ("Shelly", &["shelly"]),
    ("IKEA", &["ikea", "tradfri", "dirigera"]),
    ("Aqara", &["aqara", "lumi"]),
    ("TP-Link", &["tplink", "tp_link", "tp-link", "kasa", "tapo"]),
    ("Apple", &["apple", "homepod"]),
    ("Samsung", &["samsung", "smartthings"]),
    ("LG", &["webos", "lg"]),
    ("Xiaomi", &["xiaomi", "mijia"]),
    ("Lutron", &["lutron", "caseta"]),
    ("Tado", &["tado"]),
    ("Netatmo", &["netatmo"]),
    ("Easee", &["easee"]),
    ("Zaptec", &["zaptec"]),
    ("Wallbox", &["wallbox"]),
];

/// A compiled regex with a name for tracing
#[derive(Debug, Clone)]
pub struct NamedPattern {
    pub name: String,
    pub regex: Regex,
}

impl NamedPattern {
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// A detection pattern; absent clauses are not checked
#[derive(Debug, Clone)]
pub struct DetectionPattern {
    pub name: String,
    pub entity_id: Option<Regex>,
    /// Lowercase manufacturer substrings, any of which must match
    pub manufacturers: Vec<String>,
    pub model: Option<Regex>,
}

/// A fixed-function device family with one visible entity per unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandFamily {
    pub name: String,
    pub tokens: Vec<String>,
    pub status_suffix: String,
}

impl BrandFamily {
    /// Whether an entity belongs to this family
    pub fn matches(&self, entity_id: &str, name_lower: &str) -> bool {
        self.tokens
            .iter()
            .any(|token| entity_id.contains(token.as_str()) || name_lower.contains(token.as_str()))
    }
}

/// A named browsing bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandBucket {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Immutable pattern tables shared by the classifier, resolver and bucketer
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    pub(crate) sub_entity_patterns: Vec<NamedPattern>,
    pub(crate) name_patterns: Vec<NamedPattern>,
    pub(crate) sub_entity_switch: Regex,
    pub(crate) brand_sub_controls: Regex,
    pub(crate) media_proxy: Regex,
    pub(crate) media_aggregate: Regex,
    pub(crate) camera_accessory_patterns: Vec<Regex>,
    pub(crate) camera_suffixes: Vec<Regex>,
    pub(crate) detection_patterns: Vec<DetectionPattern>,
    pub(crate) camera_name_token: Regex,
    pub(crate) brand_keywords: Vec<String>,
    pub(crate) brand_families: Vec<BrandFamily>,
    pub(crate) brand_buckets: Vec<BrandBucket>,
}

pub(crate) fn compile(table: &'static str, pattern: &str) -> GroupingResult<Regex> {
    Regex::new(pattern).map_err(|source| GroupingError::InvalidPattern {
        table,
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_all<'a>(
    table: &'static str,
    patterns: impl IntoIterator<Item = &'a str>,
) -> GroupingResult<Vec<Regex>> {
    patterns.into_iter().map(|p| compile(table, p)).collect()
}

fn lowercase_all<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    items.into_iter().map(str::to_lowercase).collect()
}

impl PatternLibrary {
    /// Build the library from the built-in tables only
    pub fn new() -> GroupingResult<Self> {
        Self::from_config(&GroupingConfig::default())
    }

    /// Build the library from the built-in tables plus configured additions
    pub fn from_config(config: &GroupingConfig) -> GroupingResult<Self> {
        let mut sub_entity_patterns = SUB_ENTITY_PATTERNS
            .iter()
            .map(|(name, pattern)| {
                Ok(NamedPattern {
                    name: (*name).to_string(),
                    regex: compile("sub_entity_patterns", pattern)?,
                })
            })
            .collect::<GroupingResult<Vec<_>>>()?;
        for pattern in &config.sub_entity_patterns {
            sub_entity_patterns.push(NamedPattern {
                name: pattern.clone(),
                regex: compile("sub_entity_patterns", pattern)?,
            });
        }

        let name_patterns = NAME_PATTERNS
            .iter()
            .copied()
            .chain(config.name_patterns.iter().map(String::as_str))
            .map(|pattern| {
                Ok(NamedPattern {
                    name: pattern.to_string(),
                    regex: compile("name_patterns", pattern)?,
                })
            })
            .collect::<GroupingResult<Vec<_>>>()?;

        let camera_accessory_patterns = compile_all(
            "camera_accessory_patterns",
            CAMERA_ACCESSORY_PATTERNS
                .iter()
                .copied()
                .chain(config.camera_accessory_patterns.iter().map(String::as_str)),
        )?;

        let mut detection_patterns = DETECTION_PATTERNS
            .iter()
            .map(|(name, entity_id, manufacturers, model)| {
                Ok(DetectionPattern {
                    name: (*name).to_string(),
                    entity_id: entity_id.map(|p| compile("detection_patterns", p)).transpose()?,
                    manufacturers: lowercase_all(manufacturers.iter().copied()),
                    model: model.map(|p| compile("detection_patterns", p)).transpose()?,
                })
            })
            .collect::<GroupingResult<Vec<_>>>()?;
        for pattern in &config.detection_patterns {
            detection_patterns.push(detection_from_config(pattern)?);
        }

        let brand_keywords = lowercase_all(
            BRAND_KEYWORDS
                .iter()
                .copied()
                .chain(config.brand_keywords.iter().map(String::as_str)),
        );

        let brand_families = BRAND_FAMILIES
            .iter()
            .map(|(name, tokens, suffix)| BrandFamily {
                name: (*name).to_string(),
                tokens: lowercase_all(tokens.iter().copied()),
                status_suffix: (*suffix).to_string(),
            })
            .chain(config.brand_families.iter().map(family_from_config))
            .collect();

        // Configured buckets come first so they can claim keywords from built-ins
        let brand_buckets = config
            .brand_buckets
            .iter()
            .map(bucket_from_config)
            .chain(BRAND_BUCKETS.iter().map(|(name, keywords)| BrandBucket {
                name: (*name).to_string(),
                keywords: lowercase_all(keywords.iter().copied()),
            }))
            .collect();

        Ok(Self {
            sub_entity_patterns,
            name_patterns,
            sub_entity_switch: compile("sub_entity_switch", SUB_ENTITY_SWITCH)?,
            brand_sub_controls: compile("brand_sub_controls", BRAND_SUB_CONTROLS)?,
            media_proxy: compile("media_proxy", MEDIA_PROXY)?,
            media_aggregate: compile("media_aggregate", MEDIA_AGGREGATE)?,
            camera_accessory_patterns,
            camera_suffixes: compile_all("camera_suffixes", CAMERA_SUFFIXES.iter().copied())?,
            detection_patterns,
            camera_name_token: compile("camera_name_token", CAMERA_NAME_TOKEN)?,
            brand_keywords,
            brand_families,
            brand_buckets,
        })
    }

    /// The brand family an entity belongs to, if any
    pub fn brand_family(&self, entity_id: &str, name_lower: &str) -> Option<&BrandFamily> {
        self.brand_families
            .iter()
            .find(|family| family.matches(entity_id, name_lower))
    }

    /// Whether the id or name carries a vehicle-charger or NAS brand keyword
    pub fn has_brand_keyword(&self, entity_id: &str, name_lower: &str) -> bool {
        self.brand_keywords
            .iter()
            .any(|kw| contains_keyword(entity_id, kw) || contains_keyword(name_lower, kw))
    }

    /// Switch object ids for LEDs, indicators and child locks
    pub fn is_sub_entity_switch(&self, object_id: &str) -> bool {
        self.sub_entity_switch.is_match(object_id)
    }

    /// Name of the first sub-entity pattern matching the id or friendly name
    pub fn sub_entity_match(&self, entity_id: &str, friendly_name: Option<&str>) -> Option<&str> {
        if let Some(pattern) = self.sub_entity_patterns.iter().find(|p| p.is_match(entity_id)) {
            return Some(&pattern.name);
        }
        let name = friendly_name?;
        self.name_patterns
            .iter()
            .find(|p| p.is_match(name))
            .map(|p| p.name.as_str())
    }

    /// Speaker tone and mode controls
    pub fn is_brand_sub_control(&self, object_id: &str) -> bool {
        self.brand_sub_controls.is_match(object_id)
    }

    /// Media players standing in for a camera or doorbell
    pub fn is_media_proxy(&self, object_id: &str, name_lower: &str) -> bool {
        self.media_proxy.is_match(object_id) || self.media_proxy.is_match(name_lower)
    }

    /// Media players aggregating several speakers
    pub fn is_media_aggregate(&self, object_id: &str) -> bool {
        self.media_aggregate.is_match(object_id)
    }

    /// Canonical bucket name for free text (device name, entity id,
    /// manufacturer or integration)
    pub fn bucket_for(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.brand_buckets
            .iter()
            .find(|bucket| bucket.keywords.iter().any(|kw| contains_keyword(&text, kw)))
            .map(|bucket| bucket.name.as_str())
    }

    pub fn brand_families(&self) -> &[BrandFamily] {
        &self.brand_families
    }

    pub fn brand_buckets(&self) -> &[BrandBucket] {
        &self.brand_buckets
    }
}

fn detection_from_config(config: &DetectionPatternConfig) -> GroupingResult<DetectionPattern> {
    Ok(DetectionPattern {
        name: config.name.clone(),
        entity_id: config
            .entity_id
            .as_deref()
            .map(|p| compile("detection_patterns", p))
            .transpose()?,
        manufacturers: lowercase_all(config.manufacturers.iter().map(String::as_str)),
        model: config
            .model
            .as_deref()
            .map(|p| compile("detection_patterns", p))
            .transpose()?,
    })
}

fn family_from_config(config: &BrandFamilyConfig) -> BrandFamily {
    BrandFamily {
        name: config.name.clone(),
        tokens: lowercase_all(config.tokens.iter().map(String::as_str)),
        status_suffix: config.status_suffix.clone(),
    }
}

fn bucket_from_config(config: &BrandBucketConfig) -> BrandBucket {
    BrandBucket {
        name: config.name.clone(),
        keywords: lowercase_all(config.keywords.iter().map(String::as_str)),
    }
}

/// Whether `keyword` occurs in `text` as a whole word
///
/// Underscores, dots, dashes and spaces all separate words, so `hue` matches
/// `light.hue_go` and `Philips Hue` but not `light.bluehue` or `huey`.
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    let is_boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
    text.match_indices(keyword).any(|(start, matched)| {
        is_boundary(text[..start].chars().next_back())
            && is_boundary(text[start + matched.len()..].chars().next())
    })
}
