//! Scripted controller input for headless replay.
//!
//! ```json
//! { "frames": [
//!     { "right": { "transform": { "translation": { "x": 0, "y": 0.18, "z": 0 } }, "grip": 1 } },
//!     { "repeat": 30, "right": { "transform": { "translation": { "x": 0.5, "y": 0.3, "z": 0 } }, "grip": 1 } },
//!     { "right": { "grip": 0, "transform": { "translation": { "x": 0.5, "y": 0.3, "z": 0 } } } }
//! ] }
//! ```
//!
//! A hand missing from a frame keeps its previous sample.

use brickweld::pose::pose_from_ir;
use brickweld::{FrameInput, HandInput};
use brickweld_ir::Transform;
use serde::Deserialize;

/// A replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Frames in order.
    pub frames: Vec<ScriptFrame>,
}

/// One scripted frame, optionally repeated.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFrame {
    /// How many ticks to hold this input.
    #[serde(default = "one")]
    pub repeat: u32,
    /// Left hand sample.
    #[serde(default)]
    pub left: Option<ScriptHand>,
    /// Right hand sample.
    #[serde(default)]
    pub right: Option<ScriptHand>,
}

/// A hand sample.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptHand {
    /// Grip pose in world space.
    #[serde(default)]
    pub transform: Transform,
    /// Analog grip value.
    #[serde(default)]
    pub grip: f32,
}

fn one() -> u32 {
    1
}

impl ScriptHand {
    fn to_input(&self) -> HandInput {
        HandInput {
            pose: pose_from_ir(&self.transform),
            grip: self.grip,
        }
    }
}

impl Script {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// One [`FrameInput`] per tick.
    pub fn expand(&self) -> Vec<FrameInput> {
        let mut current = FrameInput::default();
        let mut out = Vec::new();
        for frame in &self.frames {
            if let Some(left) = &frame.left {
                current.left = left.to_input();
            }
            if let Some(right) = &frame.right {
                current.right = right.to_input();
            }
            for _ in 0..frame.repeat {
                out.push(current);
            }
        }
        out
    }
}
