//! Keeping physics bodies in step with assemblies.
//!
//! Each assembly owns at most one compound body with one shape per piece.
//! Structural changes (load, split, weld) rebuild the body from scratch;
//! every tick then moves held bodies to their controllers and copies free
//! bodies' poses back into the registry.

use nalgebra::{Point3, Translation3, UnitQuaternion, Vector3};
use tracing::{debug, warn};

use crate::config::{BodyConfig, FallbackConfig, WorkshopConfig};
use crate::controller::{Controller, Controllers, Hand};
use crate::error::{Result, WorkshopError};
use crate::physics::{BodyDesc, BodyId, BodyKind, PhysicsBackend, ShapeEntry};
use crate::pose::{centroid, Pose};
use crate::registry::{AssemblyKey, Registry};

/// Move an assembly's frame to the centroid of its pieces with identity
/// rotation. Piece world poses do not change.
pub fn recenter(registry: &mut Registry, key: AssemblyKey) -> Result<()> {
    let old_pose = registry
        .get(key)
        .ok_or(WorkshopError::UnknownAssembly(key))?
        .pose;
    let worlds: Vec<_> = registry
        .pieces_of(key)
        .map(|(k, p)| (k, old_pose * p.local))
        .collect();
    if worlds.is_empty() {
        return Ok(());
    }

    let centers: Vec<Point3<f32>> = worlds
        .iter()
        .map(|(_, w)| Point3::from(w.translation.vector))
        .collect();
    let center = centroid(&centers);
    let new_pose = Pose::from_parts(Translation3::from(center.coords), UnitQuaternion::identity());
    let inverse = new_pose.inverse();

    for (piece, world) in worlds {
        registry.set_piece_local(piece, inverse * world);
    }
    if let Some(assembly) = registry.get_mut(key) {
        assembly.pose = new_pose;
    }
    Ok(())
}

/// Discard an assembly's body and build a fresh sleeping one.
///
/// Dynamic rebuilds recenter the assembly first when `config.recenter` is
/// set; kinematic rebuilds keep the frame so a grip offset stays valid.
pub fn rebuild_body<P: PhysicsBackend>(
    registry: &mut Registry,
    physics: &mut P,
    key: AssemblyKey,
    kind: BodyKind,
    config: &BodyConfig,
) -> Result<BodyId> {
    let assembly = registry
        .get_mut(key)
        .ok_or(WorkshopError::UnknownAssembly(key))?;
    if let Some(old) = assembly.body.take() {
        physics.remove_body(old);
    }

    if kind == BodyKind::Dynamic && config.recenter {
        recenter(registry, key)?;
    }

    let shapes: Vec<ShapeEntry> = registry
        .pieces_of(key)
        .map(|(_, p)| ShapeEntry {
            hull: p.hull.clone(),
            local: p.local,
        })
        .collect();
    let pose = registry
        .get(key)
        .ok_or(WorkshopError::UnknownAssembly(key))?
        .pose;
    let shape_count = shapes.len();

    let body = physics
        .add_body(BodyDesc {
            kind,
            pose,
            mass: config.mass,
            shapes,
            sleep_threshold: config.sleep_threshold,
            sleeping: true,
        })
        .map_err(|e| WorkshopError::Physics(Box::new(e)))?;

    if let Some(assembly) = registry.get_mut(key) {
        assembly.body = Some(body);
    }
    debug!(?key, ?body, ?kind, shapes = shape_count, "rebuilt body");
    Ok(body)
}

/// Switch an assembly's body to controller-driven motion, building one if
/// the assembly has none.
pub fn make_kinematic<P: PhysicsBackend>(
    registry: &mut Registry,
    physics: &mut P,
    key: AssemblyKey,
    config: &BodyConfig,
) -> Result<()> {
    let body = registry
        .get(key)
        .ok_or(WorkshopError::UnknownAssembly(key))?
        .body;
    match body {
        Some(body) => physics.set_kinematic(body, true),
        None => {
            rebuild_body(registry, physics, key, BodyKind::Kinematic, config)?;
        }
    }
    Ok(())
}

/// Hand a released assembly back to the simulation.
///
/// The body is rebuilt dynamic at the current pose, thrown with
/// `velocity · throw_scale` and no spin, then woken.
pub fn release_free<P: PhysicsBackend>(
    registry: &mut Registry,
    physics: &mut P,
    key: AssemblyKey,
    velocity: Vector3<f32>,
    config: &WorkshopConfig,
) -> Result<()> {
    let body = rebuild_body(registry, physics, key, BodyKind::Dynamic, &config.body)?;
    let linear = velocity * config.release.throw_scale;
    physics.set_velocity(body, linear, Vector3::zeros());
    physics.wake(body);
    debug!(?key, speed = linear.norm(), "released free");
    Ok(())
}

/// Put a held assembly at its controller's grip and drive its body there.
///
/// Returns the new pose, or `None` when the controller holds nothing live.
pub fn follow_controller<P: PhysicsBackend>(
    registry: &mut Registry,
    physics: &mut P,
    controller: &Controller,
) -> Option<Pose> {
    let assembly = registry.get_mut(controller.held?)?;
    let pose = controller.pose * controller.grip;
    assembly.pose = pose;
    if let Some(body) = assembly.body {
        physics.drive_kinematic(body, &pose);
    }
    Some(pose)
}

/// Drive every held assembly from its controller and record its motion.
pub fn sync_held<P: PhysicsBackend>(
    registry: &mut Registry,
    physics: &mut P,
    controllers: &mut Controllers,
) {
    for hand in Hand::ALL {
        let controller = &mut controllers[hand];
        if let Some(pose) = follow_controller(registry, physics, controller) {
            controller
                .velocity
                .record_position(Point3::from(pose.translation.vector));
        }
    }
}

/// Copy free bodies' poses into their assemblies, recovering any that fell
/// out of the world.
pub fn sync_free<P: PhysicsBackend>(
    registry: &mut Registry,
    physics: &mut P,
    fallback: &FallbackConfig,
) {
    let keys = registry.keys().to_vec();
    for key in keys {
        let Some(assembly) = registry.get_mut(key) else {
            continue;
        };
        if assembly.is_held() {
            continue;
        }
        let Some(body) = assembly.body else {
            continue;
        };
        let Some(pose) = physics.body_pose(body) else {
            continue;
        };

        if pose.translation.vector.y < fallback.floor_height {
            let [x, y, z] = fallback.recovery_point;
            let recovered = Pose::translation(x, y, z);
            physics.teleport(body, &recovered);
            assembly.pose = recovered;
            warn!(?key, height = pose.translation.vector.y, "assembly fell out of the world, recovered");
        } else {
            assembly.pose = pose;
        }
    }
}

/// Per-tick pose synchronization: held assemblies first, then free ones.
pub fn sync_assemblies<P: PhysicsBackend>(
    registry: &mut Registry,
    physics: &mut P,
    controllers: &mut Controllers,
    config: &WorkshopConfig,
) {
    sync_held(registry, physics, controllers);
    sync_free(registry, physics, &config.fallback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Hand;
    use crate::registry::Assembly;
    use crate::testing::{block, RecordingPhysics};
    use approx::assert_relative_eq;

    fn two_piece(reg: &mut Registry, pose: Pose) -> AssemblyKey {
        let a = reg.add(Assembly::new(pose));
        reg.insert_piece(a, block("a", Pose::identity(), vec![])).unwrap();
        reg.insert_piece(a, block("b", Pose::translation(0.2, 0.0, 0.0), vec![]))
            .unwrap();
        a
    }

    #[test]
    fn rebuild_has_one_shape_per_piece() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let key = two_piece(&mut reg, Pose::translation(0.0, 1.0, 0.0));
        let cfg = BodyConfig {
            recenter: false,
            ..BodyConfig::default()
        };

        let first = rebuild_body(&mut reg, &mut physics, key, BodyKind::Dynamic, &cfg).unwrap();
        let second = rebuild_body(&mut reg, &mut physics, key, BodyKind::Dynamic, &cfg).unwrap();

        assert_eq!(physics.removed, vec![first]);
        assert_eq!(physics.body_count(), 1);
        let body = physics.body(second);
        assert_eq!(body.shapes.len(), 2);
        assert_eq!(body.shapes[1], Pose::translation(0.2, 0.0, 0.0));
        assert!(body.sleeping);
        assert_eq!(body.mass, 10.0);
        assert_eq!(reg.get(key).unwrap().body, Some(second));
    }

    #[test]
    fn dynamic_rebuild_recenters_without_moving_pieces() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let rotated = Pose::from_parts(
            Translation3::new(0.0, 1.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.4),
        );
        let key = two_piece(&mut reg, rotated);
        let before: Vec<Pose> = reg
            .pieces_of(key)
            .map(|(k, _)| reg.piece_world_pose(k).unwrap())
            .collect();

        rebuild_body(&mut reg, &mut physics, key, BodyKind::Dynamic, &BodyConfig::default())
            .unwrap();

        let assembly = reg.get(key).unwrap();
        assert_relative_eq!(assembly.pose.rotation.angle(), 0.0, epsilon = 1e-6);
        let expected_center = (before[0].translation.vector + before[1].translation.vector) / 2.0;
        assert_relative_eq!(assembly.pose.translation.vector, expected_center, epsilon = 1e-5);
        for ((k, _), old) in reg.pieces_of(key).zip(&before) {
            let now = reg.piece_world_pose(k).unwrap();
            assert_relative_eq!(now.translation.vector, old.translation.vector, epsilon = 1e-5);
        }
    }

    #[test]
    fn kinematic_rebuild_keeps_frame() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let pose = Pose::translation(0.0, 1.0, 0.0);
        let key = two_piece(&mut reg, pose);
        let body =
            rebuild_body(&mut reg, &mut physics, key, BodyKind::Kinematic, &BodyConfig::default())
                .unwrap();
        assert_eq!(reg.get(key).unwrap().pose, pose);
        assert_eq!(physics.body(body).kind, BodyKind::Kinematic);
    }

    #[test]
    fn release_throws_with_scaled_velocity() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let key = two_piece(&mut reg, Pose::identity());
        let cfg = WorkshopConfig::default();

        release_free(&mut reg, &mut physics, key, Vector3::new(0.01, 0.0, 0.0), &cfg).unwrap();

        let body = physics.body(reg.get(key).unwrap().body.unwrap());
        assert_eq!(body.kind, BodyKind::Dynamic);
        assert!(!body.sleeping);
        assert_relative_eq!(body.linvel, Vector3::new(1.2, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(body.angvel, Vector3::zeros());
    }

    #[test]
    fn held_assembly_follows_controller() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let key = two_piece(&mut reg, Pose::identity());
        make_kinematic(&mut reg, &mut physics, key, &BodyConfig::default()).unwrap();
        reg.get_mut(key).unwrap().holder = Some(Hand::Right);

        let mut controllers = Controllers::new(5);
        let right = &mut controllers[Hand::Right];
        right.held = Some(key);
        right.grip = Pose::translation(0.0, 0.0, -0.1);
        right.pose = Pose::translation(1.0, 1.0, 1.0);
        right.velocity.reset(Point3::new(1.0, 1.0, 0.8));

        sync_assemblies(&mut reg, &mut physics, &mut controllers, &WorkshopConfig::default());

        let expected = Vector3::new(1.0, 1.0, 0.9);
        let assembly = reg.get(key).unwrap();
        assert_relative_eq!(assembly.pose.translation.vector, expected, epsilon = 1e-6);
        let body = physics.body(assembly.body.unwrap());
        assert_relative_eq!(body.pose.translation.vector, expected, epsilon = 1e-6);
        assert_relative_eq!(
            controllers[Hand::Right].velocity.velocity(),
            Vector3::new(0.0, 0.0, 0.1),
            epsilon = 1e-5
        );
    }

    #[test]
    fn fallen_assembly_is_recovered() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let key = two_piece(&mut reg, Pose::identity());
        let body =
            rebuild_body(&mut reg, &mut physics, key, BodyKind::Dynamic, &BodyConfig::default())
                .unwrap();
        physics.place(body, Pose::translation(0.5, -12.0, 0.0));
        physics.set_velocity(body, Vector3::new(0.0, -20.0, 0.0), Vector3::new(1.0, 0.0, 0.0));

        let mut controllers = Controllers::new(5);
        sync_assemblies(&mut reg, &mut physics, &mut controllers, &WorkshopConfig::default());

        let recovered = Pose::translation(0.0, 10.0, 0.0);
        assert_eq!(reg.get(key).unwrap().pose, recovered);
        assert_eq!(physics.body(body).pose, recovered);
        assert_eq!(physics.body(body).linvel, Vector3::zeros());
        assert_eq!(physics.body(body).angvel, Vector3::zeros());
        assert!(reg.check_partition());
    }

    #[test]
    fn free_assembly_mirrors_body() {
        let mut physics = RecordingPhysics::default();
        let mut reg = Registry::new();
        let key = two_piece(&mut reg, Pose::identity());
        let body =
            rebuild_body(&mut reg, &mut physics, key, BodyKind::Dynamic, &BodyConfig::default())
                .unwrap();
        physics.place(body, Pose::translation(0.3, 0.2, 0.0));
        sync_free(&mut reg, &mut physics, &FallbackConfig::default());
        assert_eq!(reg.get(key).unwrap().pose, Pose::translation(0.3, 0.2, 0.0));
    }
}
