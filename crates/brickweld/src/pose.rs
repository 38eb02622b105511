//! Rigid transforms and orientation comparison.

use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};

/// Rigid placement (rotation then translation), in meters.
pub type Pose = Isometry3<f32>;

/// Convert an IR transform into a pose, normalizing the stored quaternion.
pub fn pose_from_ir(t: &brickweld_ir::Transform) -> Pose {
    let q = Quaternion::new(t.rotation.w, t.rotation.x, t.rotation.y, t.rotation.z);
    let rotation = if q.norm_squared() > f32::EPSILON {
        UnitQuaternion::from_quaternion(q)
    } else {
        UnitQuaternion::identity()
    };
    Isometry3::from_parts(
        Translation3::new(t.translation.x, t.translation.y, t.translation.z),
        rotation,
    )
}

/// Convert an IR vector into a point.
pub fn point_from_ir(v: &brickweld_ir::Vec3) -> Point3<f32> {
    Point3::new(v.x, v.y, v.z)
}

/// Similarity of two orientations in `[0, 1]`; 1 means identical rotations.
///
/// `q` and `-q` describe the same rotation, so the candidate is scored
/// against both signs and the better one is kept.
pub fn orientation_closeness(q: &UnitQuaternion<f32>, candidate: &UnitQuaternion<f32>) -> f32 {
    let a = q.coords.dot(&candidate.coords);
    let b = q.coords.dot(&(-candidate.coords));
    a.max(b)
}

/// Angle (radians) between the local X axes of two world-space orientations.
pub fn x_axis_angle(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>) -> f32 {
    let va = a * Vector3::x();
    let vb = b * Vector3::x();
    va.angle(&vb)
}

/// The `steps` rotations about the X axis that divide a full turn evenly.
pub fn symmetry_offsets(steps: u32) -> Vec<UnitQuaternion<f32>> {
    let steps = steps.max(1);
    (0..steps)
        .map(|k| {
            let angle = std::f32::consts::TAU * k as f32 / steps as f32;
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle)
        })
        .collect()
}

/// Mean of a set of points, or the origin for an empty set.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Point3<f32> {
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    if count == 0 {
        return Point3::origin();
    }
    Point3::from(sum / count as f32)
}
