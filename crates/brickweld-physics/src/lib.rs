#![warn(missing_docs)]

//! Rapier3d physics backend for brickweld.
//!
//! [`RapierWorld`] implements [`brickweld::PhysicsBackend`]: each assembly
//! becomes one compound rigid body with a collider per piece, inside a
//! walled play area.
//!
//! # Example
//!
//! ```ignore
//! use brickweld::{FrameInput, Workshop, WorkshopConfig};
//! use brickweld_physics::RapierWorld;
//!
//! let config = WorkshopConfig::default();
//! let mut world = RapierWorld::new(&config.world);
//! let mut workshop = Workshop::load(&doc, config, &mut world, &mut ())?;
//!
//! // Step at 60 Hz
//! workshop.tick(&FrameInput::default(), &mut world, &mut ());
//! ```

mod colliders;
mod error;
mod world;

pub use error::PhysicsError;
pub use world::RapierWorld;
