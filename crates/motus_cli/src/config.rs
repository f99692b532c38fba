//! Choreography file handling
//!
//! A choreography is a TOML document declaring a scene of objects with named
//! numeric fields and colors, and the animations to run against them.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use motus_animation::{Position, Rgb, SchedulerConfig, TimelineConfig, TweenConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Top-level choreography (`*.toml`)
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Choreography {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub objects: IndexMap<String, ObjectConfig>,
    #[serde(default)]
    pub tweens: Vec<TweenSpec>,
    #[serde(default)]
    pub colors: Vec<ColorSpec>,
    #[serde(default)]
    pub color_cycles: Vec<ColorCycleSpec>,
    #[serde(default)]
    pub timelines: Vec<TimelineSpec>,
    #[serde(default)]
    pub markers: Vec<MarkerSpec>,
    #[serde(default)]
    pub kills: Vec<KillSpec>,
    #[serde(default)]
    pub removals: Vec<RemovalSpec>,
    #[serde(default)]
    pub expects: Vec<ExpectSpec>,
}

/// Fixed-step playback settings
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Ticks per second
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Seconds to play
    #[serde(default = "default_seconds")]
    pub seconds: f32,
    /// Record a sample every N frames (0 disables sampling)
    #[serde(default = "default_sample_every")]
    pub sample_every: u32,
}

fn default_fps() -> u32 {
    60
}

fn default_seconds() -> f32 {
    5.0
}

fn default_sample_every() -> u32 {
    6
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            seconds: default_seconds(),
            sample_every: default_sample_every(),
        }
    }
}

/// A scene object: named numeric fields and named colors
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectConfig {
    #[serde(default)]
    pub fields: IndexMap<String, f32>,
    #[serde(default)]
    pub colors: IndexMap<String, Rgb>,
}

/// Tween over one object's fields
#[derive(Debug, Clone, Deserialize)]
pub struct TweenSpec {
    /// Object name
    pub target: String,
    /// Goal per field
    pub to: IndexMap<String, f32>,
    /// Explicit start per field; fields not listed start from their live value
    #[serde(default)]
    pub from: IndexMap<String, f32>,
    /// `object.field` that mirrors the tween's progress on every update
    #[serde(default)]
    pub progress_field: Option<String>,
    #[serde(flatten)]
    pub config: TweenConfig,
    /// Keys no setting matched; reported by [`Choreography::unknown_keys`]
    #[serde(flatten)]
    pub extra: IndexMap<String, toml::Value>,
}

/// Transition of one color towards a goal
#[derive(Debug, Clone, Deserialize)]
pub struct ColorSpec {
    /// `object.color`
    pub target: String,
    pub to: Rgb,
    #[serde(flatten)]
    pub config: TweenConfig,
    /// Keys no setting matched; reported by [`Choreography::unknown_keys`]
    #[serde(flatten)]
    pub extra: IndexMap<String, toml::Value>,
}

/// Endless walk of one color through a palette
#[derive(Debug, Clone, Deserialize)]
pub struct ColorCycleSpec {
    /// `object.color`
    pub target: String,
    pub palette: Vec<Rgb>,
    #[serde(flatten)]
    pub config: TweenConfig,
    /// Keys no setting matched; reported by [`Choreography::unknown_keys`]
    #[serde(flatten)]
    pub extra: IndexMap<String, toml::Value>,
}

/// Timeline of tweens placed by position
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineSpec {
    /// Labels declared up front, name to offset
    #[serde(default)]
    pub labels: IndexMap<String, f32>,
    #[serde(default)]
    pub children: Vec<TimelineChildSpec>,
    #[serde(flatten)]
    pub config: TimelineConfig,
    /// Keys no setting matched; reported by [`Choreography::unknown_keys`]
    #[serde(flatten)]
    pub extra: IndexMap<String, toml::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineChildSpec {
    /// Offset, label, `label+=x` or `+=x`; defaults to after the previous child
    #[serde(default)]
    pub position: Position,
    #[serde(flatten)]
    pub tween: TweenSpec,
}

/// Named point in time recorded in the report when reached
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerSpec {
    pub name: String,
    pub at: f32,
}

/// Cancel running tweens of an object or color at a given time
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KillSpec {
    pub at: f32,
    /// `object` or `object.color`
    pub target: String,
    /// Restrict to tweens writing one of these fields
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// Drop an object from the scene at a given time
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemovalSpec {
    pub at: f32,
    pub object: String,
}

/// Expected field value at a given time
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectSpec {
    pub at: f32,
    /// `object.field`, `object.color` channel as `object.color.r`
    pub field: String,
    pub value: f32,
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
}

fn default_tolerance() -> f32 {
    1e-3
}

impl Choreography {
    /// Parse a choreography from TOML text
    pub fn from_toml(input: &str) -> Result<Self> {
        let choreo: Self = toml::from_str(input).context("Failed to parse choreography")?;
        choreo.warn_unknown_keys();
        Ok(choreo)
    }

    /// Load a choreography file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "No choreography found at {}. Run `motus init` to create one.",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let choreo: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        choreo.warn_unknown_keys();
        Ok(choreo)
    }

    /// Paths of keys inside animation entries that matched no setting, such
    /// as `tweens[0].durtion`
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut collect = |entry: String, extra: &IndexMap<String, toml::Value>| {
            keys.extend(extra.keys().map(|key| format!("{entry}.{key}")));
        };
        for (i, spec) in self.tweens.iter().enumerate() {
            collect(format!("tweens[{i}]"), &spec.extra);
        }
        for (i, spec) in self.colors.iter().enumerate() {
            collect(format!("colors[{i}]"), &spec.extra);
        }
        for (i, spec) in self.color_cycles.iter().enumerate() {
            collect(format!("color_cycles[{i}]"), &spec.extra);
        }
        for (i, spec) in self.timelines.iter().enumerate() {
            collect(format!("timelines[{i}]"), &spec.extra);
            for (j, child) in spec.children.iter().enumerate() {
                collect(format!("timelines[{i}].children[{j}]"), &child.tween.extra);
            }
        }
        keys
    }

    fn warn_unknown_keys(&self) {
        for key in self.unknown_keys() {
            warn!(%key, "ignoring unknown choreography key");
        }
    }

    /// Number of animations the choreography registers
    pub fn animation_count(&self) -> usize {
        self.tweens.len()
            + self.colors.len()
            + self.color_cycles.len()
            + self.timelines.len()
            + self.markers.len()
            + self.kills.len()
            + self.removals.len()
    }
}
