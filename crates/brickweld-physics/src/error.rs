//! Error types for the Rapier backend.

use thiserror::Error;

/// Errors that can occur when creating bodies.
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// Body description carries no collision shapes.
    #[error("Compound body needs at least one shape")]
    NoShapes,

    /// Mass is negative or not finite.
    #[error("Invalid body mass: {0}")]
    InvalidMass(f32),

    /// Pose contains NaN or infinite components.
    #[error("Body pose is not finite")]
    NonFinitePose,
}
