//! Error types for the assembly engine.

use thiserror::Error;

use crate::registry::{AssemblyKey, PieceKey};

/// Errors that can occur while loading or manipulating assemblies.
#[derive(Error, Debug)]
pub enum WorkshopError {
    /// Scene references a part that is not defined.
    #[error("Part definition not found: {0}")]
    MissingPart(String),

    /// Connector name does not follow the `peg_<channel>` / `hole_<channel>` convention.
    #[error("Invalid connector name {name:?} on part {part}")]
    InvalidConnectorName {
        /// Part definition name.
        part: String,
        /// Offending connector name.
        name: String,
    },

    /// Failed to create a collision hull.
    #[error("Failed to create collision hull for {name}: {reason}")]
    CollisionHull {
        /// Part name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// Assembly is not (or no longer) in the registry.
    #[error("Assembly {0:?} is not registered")]
    UnknownAssembly(AssemblyKey),

    /// Piece is not in the registry.
    #[error("Piece {0:?} is not registered")]
    UnknownPiece(PieceKey),

    /// Assembly owns no pieces.
    #[error("Assembly {0:?} owns no pieces")]
    EmptyAssembly(AssemblyKey),

    /// Attempted to weld an assembly onto itself.
    #[error("Assembly {0:?} cannot be welded onto itself")]
    SelfWeld(AssemblyKey),

    /// Physics collaborator rejected a request.
    #[error("Physics backend error: {0}")]
    Physics(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An I/O error occurred while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for workshop operations.
pub type Result<T> = std::result::Result<T, WorkshopError>;
