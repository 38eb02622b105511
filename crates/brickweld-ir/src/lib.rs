//! Scene document format for the brickweld snap-assembly engine.
//!
//! A scene is a library of part definitions (collision hull plus named
//! connectors) and a list of placed instances. The document is purely
//! declarative; the engine turns each instance into a piece owned by its own
//! assembly when the scene is loaded.

pub mod naming;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use naming::{parse_connector_name, part_name_for_instance, strip_numeric_suffix, ConnectorKind};

/// 3D vector with f32 components (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Rotation quaternion, `w` first. Need not be normalized on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    /// Scalar part.
    pub w: f32,
    /// I component.
    pub x: f32,
    /// J component.
    pub y: f32,
    /// K component.
    pub z: f32,
}

impl Quat {
    /// The identity rotation.
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rigid placement: rotation applied first, then translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation in meters.
    #[serde(default = "Vec3::zero")]
    pub translation: Vec3,
    /// Orientation.
    #[serde(default)]
    pub rotation: Quat,
}

impl Transform {
    /// Identity placement.
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zero(),
            rotation: Quat::identity(),
        }
    }

    /// Pure translation.
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            rotation: Quat::identity(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Collision hull of a part, in the part's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HullDef {
    /// Box centered at the part origin.
    Cuboid {
        /// Half size along each axis.
        half_extents: Vec3,
    },
    /// Convex hull of a point cloud.
    Points {
        /// Hull vertices.
        points: Vec<Vec3>,
    },
}

/// A named attachment point. The name encodes kind and channel, see
/// [`naming::parse_connector_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorDef {
    /// Object name, e.g. `peg_A001`.
    pub name: String,
    /// Placement within the part.
    #[serde(default)]
    pub transform: Transform,
}

/// Reusable part definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDef {
    /// Collision hull.
    pub hull: HullDef,
    /// Attachment points.
    #[serde(default)]
    pub connectors: Vec<ConnectorDef>,
}

/// A placed copy of a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance name, unique within the scene.
    pub name: String,
    /// Part definition key. Defaults to the instance name without its
    /// duplicate counter.
    #[serde(default)]
    pub part: Option<String>,
    /// World placement.
    #[serde(default)]
    pub transform: Transform,
}

impl Instance {
    /// Key of the part definition this instance refers to.
    pub fn part_name(&self) -> &str {
        self.part
            .as_deref()
            .unwrap_or_else(|| part_name_for_instance(&self.name))
    }
}

/// A brickweld scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDoc {
    /// Format version string.
    pub version: String,
    /// Part definitions keyed by name.
    pub parts: HashMap<String, PartDef>,
    /// Placed instances, one loose piece each.
    pub instances: Vec<Instance>,
}

impl Default for SceneDoc {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            parts: HashMap::new(),
            instances: Vec::new(),
        }
    }
}

impl SceneDoc {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
