//! Physics collaborator interface.
//!
//! The engine never simulates anything itself. It describes compound bodies,
//! hands them to a [`PhysicsBackend`], drives held bodies kinematically and
//! reads free bodies back after each integration step.

use nalgebra::Vector3;

use crate::piece::CollisionHull;
use crate::pose::Pose;

/// Opaque handle to a body owned by a physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

/// How the backend should move a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Simulated: gravity, contacts, velocity.
    Dynamic,
    /// Moved by the engine each tick, pushes dynamic bodies out of the way.
    Kinematic,
}

/// One collision shape of a compound body, placed in the body frame.
#[derive(Debug, Clone)]
pub struct ShapeEntry {
    /// Shape geometry.
    pub hull: CollisionHull,
    /// Placement relative to the body origin.
    pub local: Pose,
}

/// Everything needed to create a compound body.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    /// Dynamic or kinematic.
    pub kind: BodyKind,
    /// World placement of the body origin.
    pub pose: Pose,
    /// Total mass (kg).
    pub mass: f32,
    /// One entry per piece.
    pub shapes: Vec<ShapeEntry>,
    /// Linear speed under which the body may sleep.
    pub sleep_threshold: f32,
    /// Insert the body already asleep.
    pub sleeping: bool,
}

/// Physics engine seen from the assembly engine.
pub trait PhysicsBackend {
    /// Backend-specific failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a body and add it to the simulation.
    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, Self::Error>;

    /// Remove a body and its shapes. Unknown ids are ignored.
    fn remove_body(&mut self, body: BodyId);

    /// World pose after the last step.
    fn body_pose(&self, body: BodyId) -> Option<Pose>;

    /// Switch a body between kinematic and dynamic motion.
    fn set_kinematic(&mut self, body: BodyId, kinematic: bool);

    /// Target pose of a kinematic body for the next step.
    fn drive_kinematic(&mut self, body: BodyId, pose: &Pose);

    /// Set linear and angular velocity.
    fn set_velocity(&mut self, body: BodyId, linear: Vector3<f32>, angular: Vector3<f32>);

    /// Place a body instantly and clear its velocities.
    fn teleport(&mut self, body: BodyId, pose: &Pose);

    /// Wake a sleeping body.
    fn wake(&mut self, body: BodyId);

    /// Advance the simulation.
    fn step(&mut self, dt: f32);
}
