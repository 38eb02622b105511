//! Permanently merging one assembly into another.

use tracing::info;

use crate::error::{Result, WorkshopError};
use crate::physics::PhysicsBackend;
use crate::pose::Pose;
use crate::registry::{AssemblyKey, Registry};
use crate::scene::{NodeRef, SceneGraph};

/// Merge `moving` into `target`.
///
/// `transform` is the moving assembly's frame expressed in the target frame;
/// every moving piece gets `local' = transform · local`. The moving
/// assembly's body is removed from the physics backend, its scene node is
/// detached and the assembly leaves the registry. The target's body is left
/// stale: the caller rebuilds it.
///
/// Preconditions are checked before anything is touched.
pub fn weld<P, S>(
    registry: &mut Registry,
    physics: &mut P,
    scene: &mut S,
    moving: AssemblyKey,
    target: AssemblyKey,
    transform: &Pose,
) -> Result<()>
where
    P: PhysicsBackend,
    S: SceneGraph + ?Sized,
{
    if moving == target {
        return Err(WorkshopError::SelfWeld(moving));
    }
    if !registry.contains(target) {
        return Err(WorkshopError::UnknownAssembly(target));
    }
    let pieces = match registry.get(moving) {
        None => return Err(WorkshopError::UnknownAssembly(moving)),
        Some(a) if a.pieces().is_empty() => return Err(WorkshopError::EmptyAssembly(moving)),
        Some(a) => a.pieces().to_vec(),
    };

    if let Some(body) = registry.get_mut(moving).and_then(|a| a.body.take()) {
        physics.remove_body(body);
    }
    scene.detach(NodeRef::Assembly(moving));

    for &piece in &pieces {
        let Some(local) = registry.piece(piece).map(|p| p.local) else {
            continue;
        };
        registry.transfer_piece(piece, target, transform * local)?;
        scene.attach(NodeRef::Piece(piece), NodeRef::Assembly(target));
    }
    registry.remove(moving, physics);

    info!(
        moved = pieces.len(),
        target_pieces = registry.get(target).map_or(0, |a| a.pieces().len()),
        "welded assembly"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnapConfig;
    use crate::registry::Assembly;
    use crate::scene::{SceneEvent, SceneLog};
    use crate::snap::find_snap;
    use crate::testing::{block, connector, RecordingPhysics};
    use approx::assert_relative_eq;
    use brickweld_ir::ConnectorKind::{Hole, Peg};
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    #[test]
    fn pieces_keep_world_pose_under_exact_transform() {
        let mut physics = RecordingPhysics::default();
        let mut scene = SceneLog::default();
        let mut reg = Registry::new();

        let target_pose = Pose::from_parts(
            Translation3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5),
        );
        let moving_pose = Pose::translation(0.0, 2.0, 0.0);
        let target = reg.add(Assembly::new(target_pose));
        let mut moving_assembly = Assembly::new(moving_pose);
        moving_assembly.body = Some(physics.spawn_dummy());
        let moving = reg.add(moving_assembly);

        let t1 = reg.insert_piece(target, block("t1", Pose::identity(), vec![])).unwrap();
        let m1 = reg
            .insert_piece(moving, block("m1", Pose::translation(0.1, 0.0, 0.0), vec![]))
            .unwrap();
        let before = reg.piece_world_pose(m1).unwrap();

        // Express the moving frame in the target frame: no visible jump.
        let transform = target_pose.inverse() * moving_pose;
        weld(&mut reg, &mut physics, &mut scene, moving, target, &transform).unwrap();

        assert!(!reg.contains(moving));
        assert_eq!(reg.get(target).unwrap().pieces(), &[t1, m1]);
        assert!(reg.check_partition());
        assert_eq!(physics.body_count(), 0);

        let after = reg.piece_world_pose(m1).unwrap();
        assert_relative_eq!(after.translation.vector, before.translation.vector, epsilon = 1e-5);
        assert_relative_eq!(after.rotation.angle_to(&before.rotation), 0.0, epsilon = 1e-3);

        assert_eq!(scene.events[0], SceneEvent::Detach(NodeRef::Assembly(moving)));
        assert_eq!(
            scene.parent_of(NodeRef::Piece(m1)),
            Some(NodeRef::Assembly(target))
        );
    }

    #[test]
    fn preconditions_leave_registry_untouched() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let a = reg.add(Assembly::new(Pose::identity()));
        let empty = reg.add(Assembly::new(Pose::identity()));
        reg.insert_piece(a, block("p", Pose::identity(), vec![])).unwrap();
        let gone = reg.add(Assembly::new(Pose::identity()));
        reg.remove(gone, &mut physics);

        let id = Pose::identity();
        assert!(matches!(
            weld(&mut reg, &mut physics, &mut (), a, a, &id),
            Err(WorkshopError::SelfWeld(_))
        ));
        assert!(matches!(
            weld(&mut reg, &mut physics, &mut (), gone, a, &id),
            Err(WorkshopError::UnknownAssembly(k)) if k == gone
        ));
        assert!(matches!(
            weld(&mut reg, &mut physics, &mut (), a, gone, &id),
            Err(WorkshopError::UnknownAssembly(k)) if k == gone
        ));
        assert!(matches!(
            weld(&mut reg, &mut physics, &mut (), empty, a, &id),
            Err(WorkshopError::EmptyAssembly(_))
        ));
        assert_eq!(reg.len(), 2);
        assert!(reg.check_partition());
    }

    #[test]
    fn later_snaps_find_the_absorbing_assembly() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let cfg = SnapConfig::default();

        let y = reg.add(Assembly::new(Pose::identity()));
        reg.insert_piece(
            y,
            block(
                "y",
                Pose::identity(),
                vec![connector(Hole, "A", Pose::translation(0.0, 0.05, 0.0))],
            ),
        )
        .unwrap();
        let x = reg.add(Assembly::new(Pose::translation(0.0, 0.11, 0.0)));
        reg.insert_piece(
            x,
            block(
                "x",
                Pose::identity(),
                vec![
                    connector(Peg, "A", Pose::translation(0.0, -0.05, 0.0)),
                    connector(Hole, "B", Pose::translation(0.0, 0.05, 0.0)),
                ],
            ),
        )
        .unwrap();

        let snap = find_snap(&reg, x, &cfg).unwrap();
        assert_eq!(snap.target, y);
        weld(&mut reg, &mut physics, &mut (), x, y, &snap.transform).unwrap();

        // A third piece aimed at x's upper hole must weld onto y.
        let z = reg.add(Assembly::new(Pose::translation(0.0, 0.21, 0.0)));
        reg.insert_piece(
            z,
            block(
                "z",
                Pose::identity(),
                vec![connector(Peg, "B", Pose::translation(0.0, -0.05, 0.0))],
            ),
        )
        .unwrap();
        let snap = find_snap(&reg, z, &cfg).unwrap();
        assert_eq!(snap.target, y);
        assert_relative_eq!(
            snap.transform.translation.vector,
            Vector3::new(0.0, 0.2, 0.0),
            epsilon = 1e-5
        );
    }
}
