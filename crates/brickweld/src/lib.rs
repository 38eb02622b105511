#![warn(missing_docs)]

//! Snap-together assembly engine.
//!
//! Pieces loaded from a [`brickweld_ir::SceneDoc`] start out as single-piece
//! [`Assembly`]s. Two tracked hands grab, split and release them; a released
//! assembly whose peg or hole lands on a compatible connector of another
//! assembly is welded into it permanently, otherwise it is thrown back into
//! the physics simulation.
//!
//! The engine owns the grouping ([`Registry`]) and decides *when* it changes
//! and *what* transform a weld applies. Simulation and rendering are
//! collaborators behind the [`PhysicsBackend`] and [`SceneGraph`] traits.
//!
//! # Example
//!
//! ```ignore
//! use brickweld::{FrameInput, Workshop, WorkshopConfig};
//!
//! let doc = brickweld_ir::SceneDoc::from_json(&std::fs::read_to_string("scene.json")?)?;
//! let mut physics = brickweld_physics::RapierWorld::new(&WorkshopConfig::default().world);
//! let mut workshop = Workshop::load(&doc, WorkshopConfig::default(), &mut physics, &mut ())?;
//! workshop.tick(&FrameInput::default(), &mut physics, &mut ());
//! ```

pub mod config;
pub mod connectivity;
pub mod controller;
pub mod error;
pub mod loader;
pub mod physics;
pub mod piece;
pub mod pose;
pub mod registry;
pub mod scene;
pub mod select;
pub mod session;
pub mod snap;
pub mod sync;
pub mod weld;

#[cfg(test)]
mod testing;

pub use config::WorkshopConfig;
pub use controller::{Controller, Controllers, Hand, VelocityEstimator};
pub use error::{Result, WorkshopError};
pub use physics::{BodyDesc, BodyId, BodyKind, PhysicsBackend, ShapeEntry};
pub use piece::{CollisionHull, Connector, Piece};
pub use pose::Pose;
pub use registry::{Assembly, AssemblyKey, PieceKey, Registry};
pub use scene::{HandPose, NodeRef, SceneGraph};
pub use select::CandidateTransform;
pub use session::{FrameInput, HandInput, Release, Workshop};
