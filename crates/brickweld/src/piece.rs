//! Pieces, their connectors and collision hulls.

use std::fmt;

use nalgebra::{Point3, Vector3};
use parry3d::query::PointQuery;
use parry3d::shape::SharedShape;

use brickweld_ir::{ConnectorDef, ConnectorKind, HullDef, PartDef};

use crate::error::{Result, WorkshopError};
use crate::pose::{point_from_ir, pose_from_ir, Pose};
use crate::registry::AssemblyKey;

/// A named snap point on a piece. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    /// Object name from the asset, e.g. `peg_A001`.
    pub name: String,
    /// Peg or hole.
    pub kind: ConnectorKind,
    /// Channel id; only equal channels mate.
    pub channel: String,
    /// Placement within the piece.
    pub local: Pose,
}

impl Connector {
    /// Build a connector from its asset definition.
    pub fn from_def(part: &str, def: &ConnectorDef) -> Result<Self> {
        let (kind, channel) = brickweld_ir::parse_connector_name(&def.name).ok_or_else(|| {
            WorkshopError::InvalidConnectorName {
                part: part.to_string(),
                name: def.name.clone(),
            }
        })?;
        Ok(Self {
            name: def.name.clone(),
            kind,
            channel,
            local: pose_from_ir(&def.transform),
        })
    }

    /// Whether `self` and `other` are complementary kinds on the same channel.
    ///
    /// Distance and alignment are not considered here.
    pub fn compatible(&self, other: &Connector) -> bool {
        self.kind == other.kind.complement() && self.channel == other.channel
    }
}

/// Collision geometry of a piece, in the piece's local frame.
///
/// Cheap to clone; the underlying shape is shared.
#[derive(Clone)]
pub struct CollisionHull {
    shape: SharedShape,
}

impl CollisionHull {
    /// Box hull centered at the piece origin.
    pub fn cuboid(half_extents: Vector3<f32>) -> Self {
        Self {
            shape: SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
        }
    }

    /// Convex hull of `points`.
    ///
    /// Degenerate point sets (coplanar, collinear) fall back to the bounding box.
    pub fn from_points(points: &[Point3<f32>], name: &str) -> Result<Self> {
        if points.len() < 4 {
            return Err(WorkshopError::CollisionHull {
                name: name.to_string(),
                reason: "Need at least 4 points for convex hull".to_string(),
            });
        }

        match SharedShape::convex_hull(points) {
            Some(shape) => Ok(Self { shape }),
            None => Ok(Self::bounding_box(points)),
        }
    }

    /// Build a hull from its asset definition.
    pub fn from_def(def: &HullDef, name: &str) -> Result<Self> {
        match def {
            HullDef::Cuboid { half_extents } => {
                let he = Vector3::new(half_extents.x, half_extents.y, half_extents.z);
                if he.iter().any(|v| !(*v > 0.0)) {
                    return Err(WorkshopError::CollisionHull {
                        name: name.to_string(),
                        reason: "Cuboid half extents must be positive".to_string(),
                    });
                }
                Ok(Self::cuboid(he))
            }
            HullDef::Points { points } => {
                let points: Vec<Point3<f32>> = points.iter().map(point_from_ir).collect();
                Self::from_points(&points, name)
            }
        }
    }

    /// Off-center box around `points`; the box keeps its offset from the origin.
    fn bounding_box(points: &[Point3<f32>]) -> Self {
        let mut min = Vector3::repeat(f32::INFINITY);
        let mut max = Vector3::repeat(f32::NEG_INFINITY);
        for p in points {
            min = min.inf(&p.coords);
            max = max.sup(&p.coords);
        }
        let half = ((max - min) / 2.0).map(|v| v.max(1e-4));
        let center = (max + min) / 2.0;
        let cuboid = SharedShape::cuboid(half.x, half.y, half.z);
        Self {
            shape: SharedShape::compound(vec![(Pose::translation(center.x, center.y, center.z), cuboid)]),
        }
    }

    /// The shared collision shape.
    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }

    /// Whether a point (in the frame where the hull sits at `pose`) lies inside.
    pub fn contains(&self, pose: &Pose, point: &Point3<f32>) -> bool {
        self.shape.contains_point(pose, point)
    }
}

impl fmt::Debug for CollisionHull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionHull")
            .field("shape", &self.shape.shape_type())
            .finish()
    }
}

/// A rigid fragment. Owned by exactly one assembly at any time.
#[derive(Debug, Clone)]
pub struct Piece {
    /// Instance name.
    pub name: String,
    /// Placement relative to the owning assembly.
    pub local: Pose,
    /// Collision geometry.
    pub hull: CollisionHull,
    /// Snap points; may be empty.
    pub connectors: Vec<Connector>,
    pub(crate) owner: AssemblyKey,
}

impl Piece {
    /// Instantiate a part definition. The owner is assigned on insertion.
    pub fn from_part(name: &str, part_name: &str, def: &PartDef, local: Pose) -> Result<Self> {
        let hull = CollisionHull::from_def(&def.hull, part_name)?;
        let connectors = def
            .connectors
            .iter()
            .map(|c| Connector::from_def(part_name, c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(name, local, hull, connectors))
    }

    /// A piece with explicit geometry. The owner is assigned on insertion.
    pub fn new(
        name: impl Into<String>,
        local: Pose,
        hull: CollisionHull,
        connectors: Vec<Connector>,
    ) -> Self {
        Self {
            name: name.into(),
            local,
            hull,
            connectors,
            owner: AssemblyKey::default(),
        }
    }

    /// The assembly this piece currently belongs to.
    pub fn owner(&self) -> AssemblyKey {
        self.owner
    }
}
