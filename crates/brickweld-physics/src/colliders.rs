//! Collider construction for assembly bodies and the play area.

use brickweld::ShapeEntry;
use nalgebra::Vector3;
use rapier3d::geometry::{Collider, ColliderBuilder};

/// Surface friction of every collider.
pub const FRICTION: f32 = 0.5;
/// Bounciness of every collider.
pub const RESTITUTION: f32 = 0.1;

/// Thickness (half) of the floor and wall slabs.
const SLAB: f32 = 0.1;

/// Collider for one piece of a compound body, placed in the body frame.
///
/// `mass` is this piece's share of the body mass; Rapier derives the
/// inertia from the shape.
pub fn piece_collider(entry: &ShapeEntry, mass: f32) -> Collider {
    ColliderBuilder::new(entry.hull.shape().clone())
        .position(entry.local)
        .mass(mass)
        .friction(FRICTION)
        .restitution(RESTITUTION)
        .build()
}

/// Static floor and four walls enclosing a square area of the given half size.
///
/// The floor's top face is at `y = 0`; walls are as tall as the area is wide.
pub fn play_area(half_extent: f32) -> Vec<Collider> {
    let h = half_extent;
    let slabs = [
        (Vector3::new(0.0, -SLAB, 0.0), Vector3::new(h, SLAB, h)),
        (Vector3::new(0.0, h, -(h + SLAB)), Vector3::new(h, h, SLAB)),
        (Vector3::new(0.0, h, h + SLAB), Vector3::new(h, h, SLAB)),
        (Vector3::new(-(h + SLAB), h, 0.0), Vector3::new(SLAB, h, h)),
        (Vector3::new(h + SLAB, h, 0.0), Vector3::new(SLAB, h, h)),
    ];
    slabs
        .into_iter()
        .map(|(center, half)| {
            ColliderBuilder::cuboid(half.x, half.y, half.z)
                .translation(center)
                .friction(FRICTION)
                .restitution(RESTITUTION)
                .build()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickweld::{CollisionHull, Pose};

    #[test]
    fn piece_collider_carries_its_share() {
        let entry = ShapeEntry {
            hull: CollisionHull::cuboid(Vector3::repeat(0.05)),
            local: Pose::translation(0.0, 0.1, 0.0),
        };
        let collider = piece_collider(&entry, 5.0);
        assert!((collider.mass() - 5.0).abs() < 1e-3);
        assert_eq!(collider.friction(), FRICTION);
        assert_eq!(collider.restitution(), RESTITUTION);
    }

    #[test]
    fn play_area_is_floor_and_walls() {
        let area = play_area(6.0);
        assert_eq!(area.len(), 5);
        let floor = &area[0];
        let top = floor.compute_aabb().maxs.y;
        assert!(top.abs() < 1e-6);
    }
}
