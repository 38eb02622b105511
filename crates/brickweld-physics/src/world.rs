//! Physics world management using Rapier3d.

use std::collections::HashMap;

use brickweld::config::WorldConfig;
use brickweld::{BodyDesc, BodyId, BodyKind, PhysicsBackend, Pose};
use nalgebra::Vector3;
use rapier3d::dynamics::{
    CCDSolver, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
    RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, RigidBodyType,
};
use rapier3d::geometry::{BroadPhaseMultiSap, ColliderSet, NarrowPhase};
use rapier3d::pipeline::{PhysicsPipeline, QueryPipeline};
use tracing::trace;

use crate::colliders::{piece_collider, play_area};
use crate::error::PhysicsError;

/// Rapier simulation holding one compound body per assembly.
pub struct RapierWorld {
    // Rapier components
    pipeline: PhysicsPipeline,
    gravity: Vector3<f32>,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    handles: HashMap<BodyId, RigidBodyHandle>,
    next_id: u64,
}

impl RapierWorld {
    /// A world with the configured gravity and a walled play area.
    pub fn new(config: &WorldConfig) -> Self {
        let [gx, gy, gz] = config.gravity;
        let mut world = Self::empty(Vector3::new(gx, gy, gz));
        if config.play_area_half_extent > 0.0 {
            for collider in play_area(config.play_area_half_extent) {
                world.colliders.insert(collider);
            }
        }
        world
    }

    /// A world with no static geometry at all.
    pub fn empty(gravity: Vector3<f32>) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity,
            integration_params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            handles: HashMap::new(),
            next_id: 0,
        }
    }

    /// Number of bodies created through [`PhysicsBackend::add_body`] still alive.
    pub fn body_count(&self) -> usize {
        self.handles.len()
    }

    /// Number of colliders attached to a body.
    pub fn collider_count(&self, body: BodyId) -> usize {
        self.body(body).map_or(0, |rb| rb.colliders().len())
    }

    /// Whether a body is currently asleep.
    pub fn is_sleeping(&self, body: BodyId) -> Option<bool> {
        self.body(body).map(RigidBody::is_sleeping)
    }

    /// Whether a body is moved by the engine rather than simulated.
    pub fn is_kinematic(&self, body: BodyId) -> Option<bool> {
        self.body(body).map(RigidBody::is_kinematic)
    }

    /// Linear and angular velocity of a body.
    pub fn velocity(&self, body: BodyId) -> Option<(Vector3<f32>, Vector3<f32>)> {
        self.body(body).map(|rb| (*rb.linvel(), *rb.angvel()))
    }

    /// Total mass of a body.
    pub fn mass(&self, body: BodyId) -> Option<f32> {
        self.body(body).map(RigidBody::mass)
    }

    fn body(&self, body: BodyId) -> Option<&RigidBody> {
        self.handles.get(&body).and_then(|h| self.bodies.get(*h))
    }

    fn body_mut(&mut self, body: BodyId) -> Option<&mut RigidBody> {
        let handle = *self.handles.get(&body)?;
        self.bodies.get_mut(handle)
    }
}

impl PhysicsBackend for RapierWorld {
    type Error = PhysicsError;

    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, PhysicsError> {
        if desc.shapes.is_empty() {
            return Err(PhysicsError::NoShapes);
        }
        if !desc.mass.is_finite() || desc.mass < 0.0 {
            return Err(PhysicsError::InvalidMass(desc.mass));
        }
        let t = &desc.pose.translation.vector;
        let q = &desc.pose.rotation.coords;
        if !(t.iter().all(|v| v.is_finite()) && q.iter().all(|v| v.is_finite())) {
            return Err(PhysicsError::NonFinitePose);
        }

        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        };
        let mut rigid_body = builder
            .position(desc.pose)
            .can_sleep(true)
            .sleeping(desc.sleeping)
            .build();
        rigid_body.activation_mut().normalized_linear_threshold = desc.sleep_threshold;

        let handle = self.bodies.insert(rigid_body);
        let share = desc.mass / desc.shapes.len() as f32;
        for entry in &desc.shapes {
            self.colliders
                .insert_with_parent(piece_collider(entry, share), handle, &mut self.bodies);
        }

        self.next_id += 1;
        let id = BodyId(self.next_id);
        self.handles.insert(id, handle);
        trace!(?id, shapes = desc.shapes.len(), "added body");
        Ok(id)
    }

    fn remove_body(&mut self, body: BodyId) {
        let Some(handle) = self.handles.remove(&body) else {
            return;
        };
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        trace!(?body, "removed body");
    }

    fn body_pose(&self, body: BodyId) -> Option<Pose> {
        self.body(body).map(|rb| *rb.position())
    }

    fn set_kinematic(&mut self, body: BodyId, kinematic: bool) {
        let Some(rb) = self.body_mut(body) else {
            return;
        };
        if kinematic {
            rb.set_body_type(RigidBodyType::KinematicPositionBased, true);
            let current = *rb.position();
            rb.set_next_kinematic_position(current);
        } else {
            rb.set_body_type(RigidBodyType::Dynamic, true);
        }
    }

    fn drive_kinematic(&mut self, body: BodyId, pose: &Pose) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_next_kinematic_position(*pose);
            rb.wake_up(true);
        }
    }

    fn set_velocity(&mut self, body: BodyId, linear: Vector3<f32>, angular: Vector3<f32>) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_linvel(linear, true);
            rb.set_angvel(angular, true);
        }
    }

    fn teleport(&mut self, body: BodyId, pose: &Pose) {
        if let Some(rb) = self.body_mut(body) {
            rb.set_position(*pose, true);
            if rb.is_kinematic() {
                rb.set_next_kinematic_position(*pose);
            }
            rb.set_linvel(Vector3::zeros(), true);
            rb.set_angvel(Vector3::zeros(), true);
        }
    }

    fn wake(&mut self, body: BodyId) {
        if let Some(rb) = self.body_mut(body) {
            rb.wake_up(true);
        }
    }

    fn step(&mut self, dt: f32) {
        self.integration_params.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use brickweld::{CollisionHull, ShapeEntry};

    fn brick_desc(kind: BodyKind, pose: Pose, sleeping: bool) -> BodyDesc {
        BodyDesc {
            kind,
            pose,
            mass: 10.0,
            shapes: vec![
                ShapeEntry {
                    hull: CollisionHull::cuboid(Vector3::repeat(0.05)),
                    local: Pose::identity(),
                },
                ShapeEntry {
                    hull: CollisionHull::cuboid(Vector3::repeat(0.05)),
                    local: Pose::translation(0.0, 0.1, 0.0),
                },
            ],
            sleep_threshold: 1.0,
            sleeping,
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut world = RapierWorld::new(&WorldConfig::default());
        let id = world
            .add_body(brick_desc(BodyKind::Dynamic, Pose::translation(0.0, 1.0, 0.0), true))
            .unwrap();
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.collider_count(id), 2);
        assert_eq!(world.is_sleeping(id), Some(true));
        world.step(1.0 / 60.0);
        assert_relative_eq!(world.mass(id).unwrap(), 10.0, epsilon = 1e-3);

        world.remove_body(id);
        assert_eq!(world.body_count(), 0);
        assert!(world.body_pose(id).is_none());
        // Removing twice is harmless.
        world.remove_body(id);
    }

    #[test]
    fn test_rejects_empty_body() {
        let mut world = RapierWorld::empty(Vector3::zeros());
        let mut desc = brick_desc(BodyKind::Dynamic, Pose::identity(), false);
        desc.shapes.clear();
        assert!(matches!(world.add_body(desc), Err(PhysicsError::NoShapes)));

        let mut desc = brick_desc(BodyKind::Dynamic, Pose::identity(), false);
        desc.mass = f32::NAN;
        assert!(matches!(world.add_body(desc), Err(PhysicsError::InvalidMass(_))));
    }

    #[test]
    fn test_awake_body_falls() {
        let mut world = RapierWorld::empty(Vector3::new(0.0, -9.81, 0.0));
        let id = world
            .add_body(brick_desc(BodyKind::Dynamic, Pose::translation(0.0, 5.0, 0.0), false))
            .unwrap();
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        assert!(world.body_pose(id).unwrap().translation.y < 5.0);
    }

    #[test]
    fn test_floor_stops_fall() {
        let mut world = RapierWorld::new(&WorldConfig::default());
        let id = world
            .add_body(brick_desc(BodyKind::Dynamic, Pose::translation(0.0, 0.5, 0.0), false))
            .unwrap();
        for _ in 0..240 {
            world.step(1.0 / 60.0);
        }
        let y = world.body_pose(id).unwrap().translation.y;
        assert!(y > -0.1 && y < 0.2, "came to rest at {y}");
    }

    #[test]
    fn test_kinematic_follows_target() {
        let mut world = RapierWorld::new(&WorldConfig::default());
        let id = world
            .add_body(brick_desc(BodyKind::Dynamic, Pose::translation(0.0, 1.0, 0.0), true))
            .unwrap();
        world.set_kinematic(id, true);
        assert_eq!(world.is_kinematic(id), Some(true));

        let target = Pose::translation(0.5, 1.5, 0.0);
        world.drive_kinematic(id, &target);
        world.step(1.0 / 60.0);
        assert_relative_eq!(
            world.body_pose(id).unwrap().translation.vector,
            target.translation.vector,
            epsilon = 1e-4
        );

        world.set_kinematic(id, false);
        assert_eq!(world.is_kinematic(id), Some(false));
    }

    #[test]
    fn test_teleport_clears_velocity() {
        let mut world = RapierWorld::empty(Vector3::new(0.0, -9.81, 0.0));
        let id = world
            .add_body(brick_desc(BodyKind::Dynamic, Pose::translation(0.0, -20.0, 0.0), false))
            .unwrap();
        world.set_velocity(id, Vector3::new(0.0, -5.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        world.teleport(id, &Pose::translation(0.0, 10.0, 0.0));

        let (lin, ang) = world.velocity(id).unwrap();
        assert_eq!(lin, Vector3::zeros());
        assert_eq!(ang, Vector3::zeros());
        assert_relative_eq!(world.body_pose(id).unwrap().translation.y, 10.0);
    }
}
