//! Test doubles for the collaborator traits.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};

use brickweld_ir::ConnectorKind;

use crate::physics::{BodyDesc, BodyId, BodyKind, PhysicsBackend};
use crate::piece::{CollisionHull, Connector, Piece};
use crate::pose::Pose;

#[derive(Debug, Clone)]
pub struct FakeBody {
    pub kind: BodyKind,
    pub pose: Pose,
    pub shapes: Vec<Pose>,
    pub linvel: Vector3<f32>,
    pub angvel: Vector3<f32>,
    pub sleeping: bool,
    pub mass: f32,
}

/// Keeps bodies in a map and integrates velocity without gravity or contacts.
#[derive(Debug, Default)]
pub struct RecordingPhysics {
    pub bodies: BTreeMap<BodyId, FakeBody>,
    next: u64,
    pub steps: usize,
    pub removed: Vec<BodyId>,
    /// Reject every `add_body` while set.
    pub fail_adds: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("fake physics failure")]
pub struct FakeError;

impl RecordingPhysics {
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn body(&self, id: BodyId) -> &FakeBody {
        &self.bodies[&id]
    }

    /// Insert an empty sleeping body.
    pub fn spawn_dummy(&mut self) -> BodyId {
        self.add_body(BodyDesc {
            kind: BodyKind::Dynamic,
            pose: Pose::identity(),
            mass: 1.0,
            shapes: Vec::new(),
            sleep_threshold: 1.0,
            sleeping: true,
        })
        .unwrap()
    }

    /// Move a body as if the simulation had carried it there.
    pub fn place(&mut self, id: BodyId, pose: Pose) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.pose = pose;
        }
    }
}

impl PhysicsBackend for RecordingPhysics {
    type Error = FakeError;

    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, FakeError> {
        if self.fail_adds {
            return Err(FakeError);
        }
        self.next += 1;
        let id = BodyId(self.next);
        self.bodies.insert(
            id,
            FakeBody {
                kind: desc.kind,
                pose: desc.pose,
                shapes: desc.shapes.iter().map(|s| s.local).collect(),
                linvel: Vector3::zeros(),
                angvel: Vector3::zeros(),
                sleeping: desc.sleeping,
                mass: desc.mass,
            },
        );
        Ok(id)
    }

    fn remove_body(&mut self, body: BodyId) {
        if self.bodies.remove(&body).is_some() {
            self.removed.push(body);
        }
    }

    fn body_pose(&self, body: BodyId) -> Option<Pose> {
        self.bodies.get(&body).map(|b| b.pose)
    }

    fn set_kinematic(&mut self, body: BodyId, kinematic: bool) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.kind = if kinematic {
                BodyKind::Kinematic
            } else {
                BodyKind::Dynamic
            };
        }
    }

    fn drive_kinematic(&mut self, body: BodyId, pose: &Pose) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pose = *pose;
        }
    }

    fn set_velocity(&mut self, body: BodyId, linear: Vector3<f32>, angular: Vector3<f32>) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.linvel = linear;
            b.angvel = angular;
        }
    }

    fn teleport(&mut self, body: BodyId, pose: &Pose) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.pose = *pose;
            b.linvel = Vector3::zeros();
            b.angvel = Vector3::zeros();
        }
    }

    fn wake(&mut self, body: BodyId) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.sleeping = false;
        }
    }

    fn step(&mut self, dt: f32) {
        self.steps += 1;
        for b in self.bodies.values_mut() {
            if b.kind == BodyKind::Dynamic && !b.sleeping {
                b.pose.translation.vector += b.linvel * dt;
            }
        }
    }
}

pub fn connector(kind: ConnectorKind, channel: &str, local: Pose) -> Connector {
    Connector {
        name: format!("{}_{}", kind.prefix(), channel),
        kind,
        channel: channel.to_string(),
        local,
    }
}

/// 0.1 m cube with the given connectors.
pub fn block(name: &str, local: Pose, connectors: Vec<Connector>) -> Piece {
    Piece::new(
        name,
        local,
        CollisionHull::cuboid(Vector3::repeat(0.05)),
        connectors,
    )
}

pub fn point(x: f32, y: f32, z: f32) -> Point3<f32> {
    Point3::new(x, y, z)
}
