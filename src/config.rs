//! Emitter configuration and its JSON representation.
//!
//! [`EmitterConfig`] is the flat option set an emitter is built from. Every
//! field has a default, so a configuration is usually written as a
//! [`ConfigPatch`] containing only the fields that differ:
//!
//! ```
//! use pieces::{ConfigPatch, EmitterConfig};
//!
//! let patch = ConfigPatch::from_json(r#"{
//!     "spawnInterval": 100,
//!     "filters": { "tint": { "colors": [255, 128, 0] } }
//! }"#).unwrap();
//!
//! let config = EmitterConfig::default().merge(patch);
//! assert_eq!(config.spawn_interval, 100.0);
//! assert_eq!(config.max_life_time, 5000.0);
//! assert!(config.filters.get("tint").is_some());
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::asset::AssetSource;

// ============================================================================
// Filter Options
// ============================================================================

/// Options handed to a pixel filter.
///
/// The built-in filters read `colors` (0-255 per channel) and `strength`.
/// Any other keys are preserved in `extra` for custom filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FilterOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FilterOptions {
    /// Options with only `colors` set.
    pub fn colors(colors: [f64; 3]) -> Self {
        Self {
            colors: Some(colors.to_vec()),
            ..Self::default()
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Returns color channel `index`, treating missing, zero and NaN alike as 0.
    pub fn channel(&self, index: usize) -> f64 {
        self.colors
            .as_ref()
            .and_then(|c| c.get(index).copied())
            .filter(|v| !v.is_nan())
            .unwrap_or(0.0)
    }

    /// Returns `strength`, falling back to 1 when it is missing, zero or NaN.
    pub fn strength_or_full(&self) -> f64 {
        match self.strength {
            Some(s) if s != 0.0 && !s.is_nan() => s,
            _ => 1.0,
        }
    }

    /// Merges `other` over `self`: present fields overwrite, extra keys are
    /// merged one level deep.
    pub fn merge(mut self, other: FilterOptions) -> Self {
        if other.colors.is_some() {
            self.colors = other.colors;
        }
        if other.strength.is_some() {
            self.strength = other.strength;
        }
        for (key, value) in other.extra {
            self.extra.insert(key, value);
        }
        self
    }
}

// ============================================================================
// Filter Chain
// ============================================================================

/// An ordered mapping of filter name to options.
///
/// Serializes as a JSON object; key order is the application order and is
/// preserved through a round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    entries: Vec<(String, FilterOptions)>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter, builder style.
    pub fn with(mut self, name: impl Into<String>, options: FilterOptions) -> Self {
        self.insert(name, options);
        self
    }

    /// Sets the options for `name`, keeping its position if it already exists.
    pub fn insert(&mut self, name: impl Into<String>, options: FilterOptions) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = options,
            None => self.entries.push((name, options)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FilterOptions> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, o)| o)
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterOptions> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterOptions)> {
        self.entries.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges `other` into this chain name by name. Existing names keep their
    /// position and have their options merged; new names are appended.
    pub fn merge(mut self, other: FilterChain) -> Self {
        for (name, options) in other.entries {
            match self.entries.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => *existing = std::mem::take(existing).merge(options),
                None => self.entries.push((name, options)),
            }
        }
        self
    }
}

impl Serialize for FilterChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, options) in &self.entries {
            map.serialize_entry(name, options)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterChain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChainVisitor;

        impl<'de> Visitor<'de> for ChainVisitor {
            type Value = FilterChain;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of filter names to options")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut chain = FilterChain::new();
                while let Some((name, options)) = access.next_entry::<String, FilterOptions>()? {
                    chain.insert(name, options);
                }
                Ok(chain)
            }
        }

        deserializer.deserialize_map(ChainVisitor)
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for FilterChain {
    fn schema_name() -> String {
        "FilterChain".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        <std::collections::BTreeMap<String, FilterOptions>>::json_schema(generator)
    }
}

// ============================================================================
// Emitter Config
// ============================================================================

/// Complete emitter configuration.
///
/// Field names serialize in camelCase (`spawnInterval`, `maxLifeTime`, ...).
/// Times are in milliseconds; velocities and rotation speed are per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct EmitterConfig {
    /// Render engine name, looked up in the registry.
    pub render: String,
    /// Particle kind name, looked up in the registry.
    pub particle_name: String,
    /// Minimum time between two spawns.
    pub spawn_interval: f64,
    /// Suppresses spawning. Live particles keep animating.
    pub paused: bool,
    /// Filters applied to the sprite before the first frame, in order.
    pub filters: FilterChain,

    pub max_life_time: f64,
    pub size: f64,
    pub life_time: f64,
    pub start_size: f64,
    pub end_size: f64,
    pub grow_factor: f64,
    pub position_x: f64,
    pub position_y: f64,
    pub velocity_x: f64,
    pub velocity_x_random_factor: f64,
    pub velocity_y: f64,
    pub velocity_y_random_factor: f64,
    pub rotation_angle_span: f64,
    pub rotation_speed: f64,
    pub start_opacity: f64,
    pub opacity_decline_speed: f64,

    /// Sprite image: a path, a `data:` URI, inline SVG or `emoji:<char>`.
    #[cfg_attr(feature = "jsonschema", schemars(with = "String"))]
    pub image: AssetSource,

    /// Stacking order of the render surface.
    pub z_index: i32,

    /// Seed for the particle randomizer. `None` seeds from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            render: "canvas".into(),
            particle_name: "standard".into(),
            spawn_interval: 40.0,
            paused: false,
            filters: FilterChain::new(),
            max_life_time: 5000.0,
            size: 0.0,
            life_time: 0.0,
            start_size: 30.0,
            end_size: 70.0,
            grow_factor: 0.1,
            position_x: 0.0,
            position_y: 0.0,
            velocity_x: 1.0,
            velocity_x_random_factor: 0.5,
            velocity_y: 1.0,
            velocity_y_random_factor: 3.0,
            rotation_angle_span: 180.0,
            rotation_speed: 0.2,
            start_opacity: 1.0,
            opacity_decline_speed: 0.01,
            image: AssetSource::bundled(),
            z_index: 0,
            seed: None,
        }
    }
}

impl EmitterConfig {
    /// Builds a configuration from defaults and a patch.
    pub fn from_patch(patch: ConfigPatch) -> Self {
        Self::default().merge(patch)
    }

    /// Applies `patch` over this configuration.
    ///
    /// Scalars present in the patch overwrite; `filters`, the only nested
    /// mapping, is merged name by name.
    pub fn merge(mut self, patch: ConfigPatch) -> Self {
        macro_rules! overwrite {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field {
                    self.$field = value;
                })*
            };
        }

        overwrite!(
            render,
            particle_name,
            spawn_interval,
            paused,
            max_life_time,
            size,
            life_time,
            start_size,
            end_size,
            grow_factor,
            position_x,
            position_y,
            velocity_x,
            velocity_x_random_factor,
            velocity_y,
            velocity_y_random_factor,
            rotation_angle_span,
            rotation_speed,
            start_opacity,
            opacity_decline_speed,
            image,
            z_index,
        );

        if patch.seed.is_some() {
            self.seed = patch.seed;
        }
        if let Some(filters) = patch.filters {
            self.filters = std::mem::take(&mut self.filters).merge(filters);
        }
        self
    }

    /// Parses a full or partial JSON configuration, filling gaps with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// Config Patch
// ============================================================================

/// A partial [`EmitterConfig`]: every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterChain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_life_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grow_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_x_random_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_y_random_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_angle_span: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity_decline_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "jsonschema", schemars(with = "Option<String>"))]
    pub image: Option<AssetSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
