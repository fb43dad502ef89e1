//! Rig assembly configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::naming::NamingConfig;
use crate::topology::TopologyPreset;

/// Highest display override color index accepted by the host.
pub const MAX_COLOR_INDEX: u8 = 31;

fn default_joint_radius() -> f64 {
    3.0
}

fn default_toe_length() -> f64 {
    5.0
}

/// Skeleton builder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkeletonSettings {
    /// Display radius of created joints.
    #[serde(default = "default_joint_radius")]
    pub joint_radius: f64,
    /// Height of the ground plane foot Base joints are dropped to.
    #[serde(default)]
    pub ground_height: f64,
    /// Distance of the Toe joint in front of the Base joint (+Z).
    #[serde(default = "default_toe_length")]
    pub toe_length: f64,
}

impl Default for SkeletonSettings {
    fn default() -> Self {
        Self {
            joint_radius: default_joint_radius(),
            ground_height: 0.0,
            toe_length: default_toe_length(),
        }
    }
}

fn default_control_radius() -> f64 {
    0.2
}

fn default_control_color() -> u8 {
    13
}

fn default_main_radius() -> f64 {
    1.0
}

fn default_offset_radius() -> f64 {
    0.8
}

fn default_offset_color() -> u8 {
    17
}

fn default_locator_scale() -> f64 {
    0.001
}

/// Controller generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSettings {
    /// Circle radius of per-joint controls.
    #[serde(default = "default_control_radius")]
    pub radius: f64,
    /// Display override color of per-joint controls.
    #[serde(default = "default_control_color")]
    pub color: u8,
    /// Circle radius of `main_ctrl`.
    #[serde(default = "default_main_radius")]
    pub main_radius: f64,
    /// Display override color of `main_ctrl`.
    #[serde(default = "default_control_color")]
    pub main_color: u8,
    /// Circle radius of `offset_ctrl`.
    #[serde(default = "default_offset_radius")]
    pub offset_radius: f64,
    /// Display override color of `offset_ctrl`.
    #[serde(default = "default_offset_color")]
    pub offset_color: u8,
    /// Shape-local scale of zero-pose locators.
    #[serde(default = "default_locator_scale")]
    pub locator_scale: f64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            radius: default_control_radius(),
            color: default_control_color(),
            main_radius: default_main_radius(),
            main_color: default_control_color(),
            offset_radius: default_offset_radius(),
            offset_color: default_offset_color(),
            locator_scale: default_locator_scale(),
        }
    }
}

/// How influence weights are initialized by the host's solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindMethod {
    ClosestDistance,
    ClosestInHierarchy,
    HeatMap,
    #[default]
    GeodesicVoxel,
}

/// Weight normalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    None,
    #[default]
    Interactive,
    Post,
}

/// Deformation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinningMethod {
    #[default]
    Linear,
    DualQuaternion,
}

fn default_max_influences() -> u8 {
    1
}

fn default_dropoff_rate() -> f64 {
    4.0
}

fn default_heatmap_falloff() -> f64 {
    0.2
}

fn default_true() -> bool {
    true
}

/// Fixed parameters handed to the host when a skin binding is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindParams {
    /// Maximum joints influencing a single vertex.
    #[serde(default = "default_max_influences")]
    pub max_influences: u8,
    /// Enforce `max_influences` while painting later.
    #[serde(default = "default_true")]
    pub obey_max_influences: bool,
    #[serde(default)]
    pub bind_method: BindMethod,
    /// Distance falloff of influence (0.1 - 10.0).
    #[serde(default = "default_dropoff_rate")]
    pub dropoff_rate: f64,
    /// Max-distance heuristic for influence inclusion (0.0 - 1.0).
    #[serde(default = "default_heatmap_falloff")]
    pub heatmap_falloff: f64,
    #[serde(default)]
    pub normalize: NormalizeMode,
    #[serde(default)]
    pub skinning_method: SkinningMethod,
    /// Bind only the listed joints rather than the whole hierarchy.
    #[serde(default = "default_true")]
    pub to_selected_bones: bool,
    /// Drop influences that end up with zero weight.
    #[serde(default = "default_true")]
    pub remove_unused_influences: bool,
}

impl Default for BindParams {
    fn default() -> Self {
        Self {
            max_influences: default_max_influences(),
            obey_max_influences: true,
            bind_method: BindMethod::default(),
            dropoff_rate: default_dropoff_rate(),
            heatmap_falloff: default_heatmap_falloff(),
            normalize: NormalizeMode::default(),
            skinning_method: SkinningMethod::default(),
            to_selected_bones: true,
            remove_unused_influences: true,
        }
    }
}

impl BindParams {
    /// Validates parameter ranges.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.max_influences == 0 {
            return Err(SpecError::InvalidConfig(
                "skin.max_influences must be at least 1".into(),
            ));
        }
        if !(0.1..=10.0).contains(&self.dropoff_rate) {
            return Err(SpecError::InvalidConfig(format!(
                "skin.dropoff_rate must be in [0.1, 10.0], got {}",
                self.dropoff_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.heatmap_falloff) {
            return Err(SpecError::InvalidConfig(format!(
                "skin.heatmap_falloff must be in [0.0, 1.0], got {}",
                self.heatmap_falloff
            )));
        }
        Ok(())
    }
}

/// Complete rig assembly configuration.
///
/// Every field has a default, so `{}` is a valid configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConfig {
    /// Topology complexity level.
    #[serde(default)]
    pub preset: TopologyPreset,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub skeleton: SkeletonSettings,
    #[serde(default)]
    pub controls: ControlSettings,
    #[serde(default)]
    pub skin: BindParams,
}

impl RigConfig {
    /// Creates the default configuration (extended biped).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let config: RigConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, SpecError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Sets the topology preset.
    pub fn with_preset(mut self, preset: TopologyPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Sets the naming suffixes.
    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    /// Sets the skeleton settings.
    pub fn with_skeleton(mut self, skeleton: SkeletonSettings) -> Self {
        self.skeleton = skeleton;
        self
    }

    /// Sets the control settings.
    pub fn with_controls(mut self, controls: ControlSettings) -> Self {
        self.controls = controls;
        self
    }

    /// Sets the skin binding parameters.
    pub fn with_skin(mut self, skin: BindParams) -> Self {
        self.skin = skin;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), SpecError> {
        let naming = &self.naming;
        for (field, suffix) in [
            ("joint_suffix", &naming.joint_suffix),
            ("control_suffix", &naming.control_suffix),
            ("offset_suffix", &naming.offset_suffix),
            ("locator_suffix", &naming.locator_suffix),
        ] {
            if suffix.is_empty() {
                return Err(SpecError::InvalidConfig(format!(
                    "naming.{} cannot be empty",
                    field
                )));
            }
        }
        let suffixes = [
            &naming.joint_suffix,
            &naming.control_suffix,
            &naming.offset_suffix,
            &naming.locator_suffix,
        ];
        if suffixes
            .iter()
            .enumerate()
            .any(|(i, a)| suffixes[i + 1..].contains(a))
        {
            return Err(SpecError::InvalidConfig(
                "naming suffixes must be distinct".into(),
            ));
        }

        for (field, value) in [
            ("skeleton.joint_radius", self.skeleton.joint_radius),
            ("skeleton.toe_length", self.skeleton.toe_length),
            ("controls.radius", self.controls.radius),
            ("controls.main_radius", self.controls.main_radius),
            ("controls.offset_radius", self.controls.offset_radius),
            ("controls.locator_scale", self.controls.locator_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SpecError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    field, value
                )));
            }
        }
        if !self.skeleton.ground_height.is_finite() {
            return Err(SpecError::InvalidConfig(
                "skeleton.ground_height must be finite".into(),
            ));
        }

        for (field, color) in [
            ("controls.color", self.controls.color),
            ("controls.main_color", self.controls.main_color),
            ("controls.offset_color", self.controls.offset_color),
        ] {
            if color > MAX_COLOR_INDEX {
                return Err(SpecError::InvalidConfig(format!(
                    "{} must be at most {}, got {}",
                    field, MAX_COLOR_INDEX, color
                )));
            }
        }

        self.skin.validate()
    }
}
