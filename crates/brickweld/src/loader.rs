//! Building assemblies from a scene document.

use brickweld_ir::SceneDoc;
use tracing::info;

use crate::config::BodyConfig;
use crate::error::{Result, WorkshopError};
use crate::physics::{BodyKind, PhysicsBackend};
use crate::piece::Piece;
use crate::pose::{pose_from_ir, Pose};
use crate::registry::{Assembly, AssemblyKey, Registry};
use crate::scene::{NodeRef, SceneGraph};
use crate::sync::rebuild_body;

/// Add one single-piece assembly per scene instance, each with a sleeping
/// dynamic body.
///
/// Every instance is resolved and validated before the registry is touched.
pub fn populate<P, S>(
    registry: &mut Registry,
    doc: &SceneDoc,
    physics: &mut P,
    scene: &mut S,
    config: &BodyConfig,
) -> Result<Vec<AssemblyKey>>
where
    P: PhysicsBackend,
    S: SceneGraph + ?Sized,
{
    let mut staged = Vec::with_capacity(doc.instances.len());
    for instance in &doc.instances {
        let part_name = instance.part_name();
        let def = doc
            .parts
            .get(part_name)
            .ok_or_else(|| WorkshopError::MissingPart(part_name.to_string()))?;
        let piece = Piece::from_part(&instance.name, part_name, def, Pose::identity())?;
        staged.push((pose_from_ir(&instance.transform), piece));
    }

    let mut keys = Vec::with_capacity(staged.len());
    for (pose, piece) in staged {
        let key = registry.add(Assembly::new(pose));
        let piece_key = registry.insert_piece(key, piece)?;
        scene.attach(NodeRef::Assembly(key), NodeRef::Root);
        scene.attach(NodeRef::Piece(piece_key), NodeRef::Assembly(key));
        rebuild_body(registry, physics, key, BodyKind::Dynamic, config)?;
        keys.push(key);
    }

    info!(
        parts = doc.parts.len(),
        assemblies = keys.len(),
        "loaded scene"
    );
    Ok(keys)
}
