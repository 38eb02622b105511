//! Which pieces of an assembly follow a second hand.
//!
//! When one hand grabs a piece of an assembly that the other hand is already
//! holding, the assembly splits. Pieces still physically mated to the other
//! hand's piece stay; the rest move with the new hand.

use std::collections::{HashSet, VecDeque};

use crate::registry::{AssemblyKey, PieceKey, Registry};

/// Whether two pieces of the same assembly have a compatible peg/hole pair
/// within `tolerance` of each other.
///
/// Both pieces share one rigid frame, so the comparison is done in assembly
/// space. Connector alignment is not checked: touching is enough.
pub fn pieces_mated(registry: &Registry, a: PieceKey, b: PieceKey, tolerance: f32) -> bool {
    let (Some(pa), Some(pb)) = (registry.piece(a), registry.piece(b)) else {
        return false;
    };
    pa.connectors.iter().any(|ca| {
        let wa = (pa.local * ca.local).translation.vector;
        pb.connectors.iter().any(|cb| {
            ca.compatible(cb) && {
                let wb = (pb.local * cb.local).translation.vector;
                (wa - wb).norm() < tolerance
            }
        })
    })
}

/// Pieces of `assembly` that should move with the hand claiming `claimed`
/// while the other hand keeps `anchor`.
///
/// Everything reachable from `anchor` through mated pairs stays. `claimed`
/// always moves, even when it closes a loop back to `anchor`. The result
/// keeps the assembly's piece order and is never empty.
pub fn moving_pieces(
    registry: &Registry,
    assembly: AssemblyKey,
    claimed: PieceKey,
    anchor: PieceKey,
    tolerance: f32,
) -> Vec<PieceKey> {
    let members: Vec<PieceKey> = registry
        .get(assembly)
        .map(|a| a.pieces().to_vec())
        .unwrap_or_default();

    let mut stays: HashSet<PieceKey> = HashSet::from([claimed, anchor]);
    let mut queue = VecDeque::from([anchor]);

    while let Some(current) = queue.pop_front() {
        for &piece in &members {
            if stays.contains(&piece) {
                continue;
            }
            if pieces_mated(registry, current, piece, tolerance) {
                stays.insert(piece);
                queue.push_back(piece);
            }
        }
    }

    stays.remove(&claimed);
    let mut moving: Vec<PieceKey> = members.into_iter().filter(|p| !stays.contains(p)).collect();
    if moving.is_empty() {
        // `claimed` was not a member; it still moves.
        moving.push(claimed);
    }
    moving
}
