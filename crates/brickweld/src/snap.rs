//! Connector matching between a released assembly and the rest of the scene.

use tracing::debug;

use crate::config::SnapConfig;
use crate::piece::Connector;
use crate::pose::{x_axis_angle, Pose};
use crate::registry::{AssemblyKey, Registry};
use crate::select::{select_transform, CandidateTransform};

/// Whether two connectors at the given world poses should snap together.
///
/// Requires complementary kinds, the same channel, positions within
/// `tolerance` and X axes within `max_angle_deg` of each other.
pub fn can_snap(
    a: &Connector,
    a_world: &Pose,
    b: &Connector,
    b_world: &Pose,
    config: &SnapConfig,
) -> bool {
    if !a.compatible(b) {
        return false;
    }
    let distance = (a_world.translation.vector - b_world.translation.vector).norm();
    if distance >= config.tolerance {
        return false;
    }
    x_axis_angle(&a_world.rotation, &b_world.rotation) < config.max_angle_deg.to_radians()
}

/// Find the first connector pair joining `held` to another assembly and the
/// transform that would weld it there.
///
/// Scans target assemblies in registry order, then their pieces and
/// connectors, then the held assembly's pieces and connectors. The first pair
/// that passes [`can_snap`] decides; there is no nearest-pair search.
pub fn find_snap(
    registry: &Registry,
    held: AssemblyKey,
    config: &SnapConfig,
) -> Option<CandidateTransform> {
    let held_assembly = registry.get(held)?;

    for (target_key, target) in registry.assemblies() {
        if target_key == held {
            continue;
        }
        for (_, target_piece) in registry.pieces_of(target_key) {
            let target_piece_world = target.pose * target_piece.local;
            for a in &target_piece.connectors {
                let a_world = target_piece_world * a.local;
                for (_, held_piece) in registry.pieces_of(held) {
                    let held_piece_world = held_assembly.pose * held_piece.local;
                    for b in &held_piece.connectors {
                        let b_world = held_piece_world * b.local;
                        if !can_snap(a, &a_world, b, &b_world, config) {
                            continue;
                        }
                        debug!(
                            target = %target_piece.name,
                            held = %held_piece.name,
                            target_connector = %a.name,
                            held_connector = %b.name,
                            "connector match"
                        );
                        let transform = select_transform(
                            &target.pose,
                            &held_assembly.pose,
                            &(target_piece.local * a.local),
                            &(held_piece.local * b.local),
                            config.symmetry_steps,
                        );
                        return Some(CandidateTransform {
                            transform,
                            target: target_key,
                        });
                    }
                }
            }
        }
    }
    None
}
