//! Choosing among symmetric docking orientations.
//!
//! A connector with n-fold symmetry about its X axis can dock in n equally
//! valid rotations. Each one gives a transform taking the held assembly's
//! frame into the target's frame; the user gets the one needing the least
//! extra rotation from how they were holding the piece.

use nalgebra::{Translation3, UnitQuaternion};

use crate::pose::{orientation_closeness, symmetry_offsets, Pose};
use crate::registry::AssemblyKey;

/// A possible weld: where the held assembly's frame lands in the target frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateTransform {
    /// Held frame expressed in the target frame.
    pub transform: Pose,
    /// Assembly to weld onto.
    pub target: AssemblyKey,
}

/// All docking transforms for one connector pair.
///
/// `target_frame` is the target connector's pose in its assembly frame
/// (piece local · connector local); `held_frame` likewise for the held
/// connector. Candidate `k` is `target_frame · R_k · held_frame⁻¹`, which
/// lands the held connector exactly on the target connector turned by `R_k`:
/// the translation is the target connector position minus the rotated held
/// offset, the rotation is target orientation · offset · inverse held
/// orientation.
pub fn candidate_transforms(target_frame: &Pose, held_frame: &Pose, steps: u32) -> Vec<Pose> {
    let held_inverse = held_frame.inverse();
    symmetry_offsets(steps)
        .into_iter()
        .map(|offset| {
            let turn = Pose::from_parts(Translation3::identity(), offset);
            target_frame * turn * held_inverse
        })
        .collect()
}

/// Index of the candidate whose rotation is closest to `relative`, the held
/// assembly's current orientation in the target frame.
///
/// Ties keep the earliest candidate. `None` only for an empty slice.
pub fn closest_candidate(relative: &UnitQuaternion<f32>, candidates: &[Pose]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let score = orientation_closeness(relative, &candidate.rotation);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Pick the docking transform for a connector pair given both assemblies'
/// current world poses.
pub fn select_transform(
    target_pose: &Pose,
    held_pose: &Pose,
    target_frame: &Pose,
    held_frame: &Pose,
    steps: u32,
) -> Pose {
    let candidates = candidate_transforms(target_frame, held_frame, steps);
    let relative = target_pose.rotation.inverse() * held_pose.rotation;
    // `symmetry_offsets` never yields an empty set.
    let index = closest_candidate(&relative, &candidates).unwrap_or(0);
    candidates[index]
}
