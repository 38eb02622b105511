//! Tunable constants, loadable from TOML.
//!
//! Every section falls back to its defaults, so a config file only needs the
//! values it changes:
//!
//! ```toml
//! [snap]
//! tolerance = 0.04
//!
//! [fallback]
//! floor_height = -5.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkshopError};

/// Connector matching parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Maximum world distance between a peg and a hole for a snap (meters).
    pub tolerance: f32,
    /// Maximum distance at which two pieces of one assembly count as still mated.
    pub mate_tolerance: f32,
    /// Maximum angle between the connectors' X axes for a snap (degrees).
    pub max_angle_deg: f32,
    /// Number of equivalent docking rotations about the connector X axis.
    pub symmetry_steps: u32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.05,
            mate_tolerance: 0.05,
            max_angle_deg: 20.0,
            symmetry_steps: 4,
        }
    }
}

/// Compound body parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Mass of every assembly body (kg).
    pub mass: f32,
    /// Linear speed below which a body may fall asleep.
    pub sleep_threshold: f32,
    /// Move a free assembly's origin to the centroid of its pieces on rebuild.
    pub recenter: bool,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass: 10.0,
            sleep_threshold: 1.0,
            recenter: true,
        }
    }
}

/// Throw-on-release parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Converts estimator displacement-per-sample into physics velocity.
    pub throw_scale: f32,
    /// Number of trailing position samples kept per controller.
    pub velocity_window: usize,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            throw_scale: 120.0,
            velocity_window: 5,
        }
    }
}

/// Lost-piece recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Free bodies below this height are recovered.
    pub floor_height: f32,
    /// Where recovered bodies reappear.
    pub recovery_point: [f32; 3],
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            floor_height: -10.0,
            recovery_point: [0.0, 10.0, 0.0],
        }
    }
}

/// Simulation world parameters, consumed by physics backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity vector (m/s²).
    pub gravity: [f32; 3],
    /// Fixed integration step (seconds).
    pub timestep: f32,
    /// Half width of the square walled play area; 0 disables floor and walls.
    pub play_area_half_extent: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.82, 0.0],
            timestep: 1.0 / 60.0,
            play_area_half_extent: 6.0,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    /// Connector matching.
    pub snap: SnapConfig,
    /// Compound bodies.
    pub body: BodyConfig,
    /// Throwing.
    pub release: ReleaseConfig,
    /// Lost-piece recovery.
    pub fallback: FallbackConfig,
    /// Simulation world.
    pub world: WorldConfig,
}

impl WorkshopConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.snap.tolerance > 0.0) {
            return Err(WorkshopError::InvalidConfig(
                "snap.tolerance must be positive".to_string(),
            ));
        }
        if !(self.snap.mate_tolerance > 0.0) {
            return Err(WorkshopError::InvalidConfig(
                "snap.mate_tolerance must be positive".to_string(),
            ));
        }
        if self.snap.symmetry_steps == 0 {
            return Err(WorkshopError::InvalidConfig(
                "snap.symmetry_steps must be at least 1".to_string(),
            ));
        }
        if self.release.velocity_window == 0 {
            return Err(WorkshopError::InvalidConfig(
                "release.velocity_window must be at least 1".to_string(),
            ));
        }
        if !(self.body.mass > 0.0) {
            return Err(WorkshopError::InvalidConfig(
                "body.mass must be positive".to_string(),
            ));
        }
        if !(self.world.timestep > 0.0) {
            return Err(WorkshopError::InvalidConfig(
                "world.timestep must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
