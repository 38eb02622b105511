//! The live set of assemblies and the pieces they own.
//!
//! Assemblies form an explicit partition of the piece set: every piece
//! records its owner and every assembly lists its pieces in order. The
//! registry is the only place that edits either side, so the two views
//! cannot drift apart. Scene graph and physics state are projections of this
//! partition.

use nalgebra::Point3;
use slotmap::{new_key_type, SlotMap};

use crate::controller::Hand;
use crate::error::{Result, WorkshopError};
use crate::physics::{BodyId, PhysicsBackend};
use crate::piece::{Connector, Piece};
use crate::pose::Pose;

new_key_type! {
    /// Stable handle to a piece.
    pub struct PieceKey;
    /// Stable handle to an assembly. Invalid once the assembly is welded away.
    pub struct AssemblyKey;
}

/// A group of pieces moving as one rigid body.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// World placement of the assembly frame.
    pub pose: Pose,
    /// Controller currently holding this assembly.
    pub holder: Option<Hand>,
    /// Physics body mirroring this assembly.
    pub body: Option<BodyId>,
    pieces: Vec<PieceKey>,
}

impl Assembly {
    /// An empty, free assembly at `pose`.
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            holder: None,
            body: None,
            pieces: Vec::new(),
        }
    }

    /// Owned pieces, in insertion order.
    pub fn pieces(&self) -> &[PieceKey] {
        &self.pieces
    }

    /// Whether a controller holds this assembly.
    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }
}

/// Owner of all assemblies and pieces.
#[derive(Debug, Default)]
pub struct Registry {
    assemblies: SlotMap<AssemblyKey, Assembly>,
    order: Vec<AssemblyKey>,
    pieces: SlotMap<PieceKey, Piece>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an assembly. Any piece list it carries is discarded; pieces
    /// join through [`Registry::insert_piece`] or [`Registry::transfer_piece`].
    pub fn add(&mut self, mut assembly: Assembly) -> AssemblyKey {
        assembly.pieces.clear();
        let key = self.assemblies.insert(assembly);
        self.order.push(key);
        key
    }

    /// Unregister an assembly and release its physics body.
    ///
    /// The assembly must not own pieces any more.
    pub fn remove<P: PhysicsBackend>(&mut self, key: AssemblyKey, physics: &mut P) -> Option<Assembly> {
        let assembly = self.assemblies.remove(key)?;
        debug_assert!(
            assembly.pieces.is_empty(),
            "removed assembly still owns pieces"
        );
        self.order.retain(|k| *k != key);
        if let Some(body) = assembly.body {
            physics.remove_body(body);
        }
        Some(assembly)
    }

    /// Live assemblies in registration order.
    pub fn assemblies(&self) -> impl Iterator<Item = (AssemblyKey, &Assembly)> + '_ {
        self.order.iter().map(move |k| (*k, &self.assemblies[*k]))
    }

    /// Keys of live assemblies in registration order.
    pub fn keys(&self) -> &[AssemblyKey] {
        &self.order
    }

    /// Look up an assembly.
    pub fn get(&self, key: AssemblyKey) -> Option<&Assembly> {
        self.assemblies.get(key)
    }

    /// Look up an assembly mutably.
    pub fn get_mut(&mut self, key: AssemblyKey) -> Option<&mut Assembly> {
        self.assemblies.get_mut(key)
    }

    /// Whether `key` names a live assembly.
    pub fn contains(&self, key: AssemblyKey) -> bool {
        self.assemblies.contains_key(key)
    }

    /// Number of live assemblies.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no assemblies are registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Add a new piece to an assembly.
    pub fn insert_piece(&mut self, owner: AssemblyKey, mut piece: Piece) -> Result<PieceKey> {
        let assembly = self
            .assemblies
            .get_mut(owner)
            .ok_or(WorkshopError::UnknownAssembly(owner))?;
        piece.owner = owner;
        let key = self.pieces.insert(piece);
        assembly.pieces.push(key);
        Ok(key)
    }

    /// Move a piece to another assembly, re-expressed by `local` in the new frame.
    pub fn transfer_piece(&mut self, piece: PieceKey, to: AssemblyKey, local: Pose) -> Result<()> {
        if !self.assemblies.contains_key(to) {
            return Err(WorkshopError::UnknownAssembly(to));
        }
        let p = self
            .pieces
            .get_mut(piece)
            .ok_or(WorkshopError::UnknownPiece(piece))?;
        let from = p.owner;
        p.owner = to;
        p.local = local;
        if let Some(old) = self.assemblies.get_mut(from) {
            old.pieces.retain(|k| *k != piece);
        }
        self.assemblies[to].pieces.push(piece);
        Ok(())
    }

    /// Replace a piece's local transform without changing its owner.
    pub(crate) fn set_piece_local(&mut self, piece: PieceKey, local: Pose) {
        if let Some(p) = self.pieces.get_mut(piece) {
            p.local = local;
        }
    }

    /// Look up a piece.
    pub fn piece(&self, key: PieceKey) -> Option<&Piece> {
        self.pieces.get(key)
    }

    /// Total number of pieces.
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Pieces of an assembly, in order.
    pub fn pieces_of(&self, key: AssemblyKey) -> impl Iterator<Item = (PieceKey, &Piece)> + '_ {
        self.assemblies
            .get(key)
            .map(|a| a.pieces.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |k| (*k, &self.pieces[*k]))
    }

    /// World pose of a piece.
    pub fn piece_world_pose(&self, key: PieceKey) -> Option<Pose> {
        let piece = self.pieces.get(key)?;
        let owner = self.assemblies.get(piece.owner)?;
        Some(owner.pose * piece.local)
    }

    /// World pose of one of a piece's connectors.
    pub fn connector_world_pose(&self, key: PieceKey, connector: &Connector) -> Option<Pose> {
        self.piece_world_pose(key).map(|p| p * connector.local)
    }

    /// First piece whose hull contains a world-space point.
    ///
    /// Assemblies are searched in registration order, pieces in assembly order.
    pub fn piece_at(&self, point: &Point3<f32>) -> Option<PieceKey> {
        self.assemblies().find_map(|(_, assembly)| {
            assembly.pieces.iter().copied().find(|k| {
                let piece = &self.pieces[*k];
                piece.hull.contains(&(assembly.pose * piece.local), point)
            })
        })
    }

    /// Verify the partition invariant: each piece listed by exactly one live
    /// assembly, and that assembly is the piece's recorded owner.
    pub fn check_partition(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        for (key, assembly) in self.assemblies() {
            for piece in &assembly.pieces {
                if !seen.insert(*piece) {
                    return false;
                }
                match self.pieces.get(*piece) {
                    Some(p) if p.owner == key => {}
                    _ => return false,
                }
            }
        }
        seen.len() == self.pieces.len() && self.order.len() == self.assemblies.len()
    }
}
