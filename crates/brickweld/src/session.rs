//! The per-frame driver tying controllers, assemblies and collaborators together.

use brickweld_ir::SceneDoc;
use nalgebra::Point3;
use tracing::{debug, error};

use crate::config::WorkshopConfig;
use crate::connectivity::moving_pieces;
use crate::controller::{ButtonEdge, Controllers, Hand};
use crate::error::{Result, WorkshopError};
use crate::loader::populate;
use crate::physics::{BodyKind, PhysicsBackend};
use crate::pose::Pose;
use crate::registry::{Assembly, AssemblyKey, PieceKey, Registry};
use crate::scene::{HandPose, NodeRef, SceneGraph};
use crate::snap::find_snap;
use crate::sync::{follow_controller, make_kinematic, rebuild_body, release_free, sync_assemblies};
use crate::weld::weld;

/// One hand's tracking sample for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandInput {
    /// Grip pose in world space.
    pub pose: Pose,
    /// Analog grip value in `[0, 1]`.
    pub grip: f32,
}

impl Default for HandInput {
    fn default() -> Self {
        Self {
            pose: Pose::identity(),
            grip: 0.0,
        }
    }
}

/// Input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Left controller.
    pub left: HandInput,
    /// Right controller.
    pub right: HandInput,
}

impl FrameInput {
    /// The sample for `hand`.
    pub fn hand(&self, hand: Hand) -> &HandInput {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }
}

/// What a release did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The hand was empty.
    Nothing,
    /// The assembly was handed back to the simulation.
    Free(AssemblyKey),
    /// The assembly snapped and was absorbed by `into`.
    Welded {
        /// Surviving assembly.
        into: AssemblyKey,
    },
}

/// A building session: the live assemblies, both hands and the tunables.
#[derive(Debug)]
pub struct Workshop {
    registry: Registry,
    controllers: Controllers,
    config: WorkshopConfig,
}

impl Workshop {
    /// An empty session.
    pub fn new(config: WorkshopConfig) -> Self {
        Self {
            registry: Registry::new(),
            controllers: Controllers::new(config.release.velocity_window),
            config,
        }
    }

    /// A session populated from a scene document.
    pub fn load<P, S>(
        doc: &SceneDoc,
        config: WorkshopConfig,
        physics: &mut P,
        scene: &mut S,
    ) -> Result<Self>
    where
        P: PhysicsBackend,
        S: SceneGraph + ?Sized,
    {
        config.validate()?;
        let mut workshop = Self::new(config);
        for hand in Hand::ALL {
            scene.attach(NodeRef::Controller(hand), NodeRef::Root);
        }
        populate(
            &mut workshop.registry,
            doc,
            physics,
            scene,
            &workshop.config.body,
        )?;
        Ok(workshop)
    }

    /// Live assemblies and pieces.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Both hands.
    pub fn controllers(&self) -> &Controllers {
        &self.controllers
    }

    /// Active configuration.
    pub fn config(&self) -> &WorkshopConfig {
        &self.config
    }

    /// Move a controller without going through a full tick.
    pub fn set_controller_pose(&mut self, hand: Hand, pose: Pose) {
        self.controllers[hand].pose = pose;
    }

    /// Advance one frame.
    ///
    /// Order is fixed: physics step, controller poses and grip edges (at
    /// most one grab or release per hand), then pose synchronization. A
    /// failing grab or release is logged and the frame carries on.
    pub fn tick<P, S>(&mut self, frame: &FrameInput, physics: &mut P, scene: &mut S)
    where
        P: PhysicsBackend,
        S: SceneGraph + ?Sized,
    {
        physics.step(self.config.world.timestep);

        for hand in Hand::ALL {
            let input = frame.hand(hand);
            let controller = &mut self.controllers[hand];
            controller.pose = input.pose;
            match controller.button.update(input.grip) {
                Some(ButtonEdge::Pressed) => {
                    if let Err(e) = self.grab(hand, physics, scene) {
                        error!(%hand, error = %e, "grab failed");
                    }
                }
                Some(ButtonEdge::Released) => {
                    if let Err(e) = self.release(hand, physics, scene) {
                        error!(%hand, error = %e, "release failed");
                    }
                }
                None => {}
            }
        }

        sync_assemblies(
            &mut self.registry,
            physics,
            &mut self.controllers,
            &self.config,
        );
        debug_assert!(self.registry.check_partition());
    }

    /// Grab whatever piece the controller is touching.
    ///
    /// Returns the assembly now held, or `None` on a lookup miss or when the
    /// hand is already full. Grabbing a different piece of an assembly the
    /// other hand holds splits it; grabbing the same piece steals it.
    pub fn grab<P, S>(
        &mut self,
        hand: Hand,
        physics: &mut P,
        scene: &mut S,
    ) -> Result<Option<AssemblyKey>>
    where
        P: PhysicsBackend,
        S: SceneGraph + ?Sized,
    {
        if self.controllers[hand].held.is_some() {
            return Ok(None);
        }
        let position = self.controllers[hand].position();
        let Some(piece) = self.registry.piece_at(&position) else {
            debug!(%hand, ?position, "grab missed");
            return Ok(None);
        };
        let Some(mut key) = self.registry.piece(piece).map(|p| p.owner()) else {
            return Ok(None);
        };

        let other = hand.other();
        let held_by_other = self.controllers[other].held == Some(key);
        if held_by_other {
            match self.controllers[other].piece {
                Some(anchor) if anchor != piece && self.owner_of(anchor) == Some(key) => {
                    key = self.split(key, piece, anchor, physics, scene)?;
                }
                _ => self.drop_grip(other, scene),
            }
        }

        self.hold(hand, key, piece, physics, scene)?;
        Ok(Some(key))
    }

    /// Let go of the held assembly: weld it if it snaps, otherwise throw it.
    pub fn release<P, S>(&mut self, hand: Hand, physics: &mut P, scene: &mut S) -> Result<Release>
    where
        P: PhysicsBackend,
        S: SceneGraph + ?Sized,
    {
        let Some(key) = self.controllers[hand].held else {
            return Ok(Release::Nothing);
        };
        if !self.registry.contains(key) {
            self.drop_grip(hand, scene);
            return Err(WorkshopError::UnknownAssembly(key));
        }
        follow_controller(&mut self.registry, physics, &self.controllers[hand]);

        if let Some(snap) = find_snap(&self.registry, key, &self.config.snap) {
            match weld(
                &mut self.registry,
                physics,
                scene,
                key,
                snap.target,
                &snap.transform,
            ) {
                Ok(()) => {
                    self.drop_grip(hand, scene);
                    let target_held = self
                        .registry
                        .get(snap.target)
                        .is_some_and(Assembly::is_held);
                    let kind = if target_held {
                        BodyKind::Kinematic
                    } else {
                        BodyKind::Dynamic
                    };
                    rebuild_body(
                        &mut self.registry,
                        physics,
                        snap.target,
                        kind,
                        &self.config.body,
                    )?;
                    return Ok(Release::Welded { into: snap.target });
                }
                Err(e) => error!(%hand, error = %e, "weld failed, releasing free"),
            }
        }

        // The hand keeps the assembly if it cannot be handed back to the simulation.
        let velocity = self.controllers[hand].velocity.velocity();
        release_free(&mut self.registry, physics, key, velocity, &self.config)?;
        self.drop_grip(hand, scene);
        scene.attach(NodeRef::Assembly(key), NodeRef::Root);
        Ok(Release::Free(key))
    }

    fn owner_of(&self, piece: PieceKey) -> Option<AssemblyKey> {
        self.registry.piece(piece).map(|p| p.owner())
    }

    /// Move the pieces following `claimed` into a new assembly at the same
    /// pose and rebuild both bodies for controller-driven motion.
    fn split<P, S>(
        &mut self,
        key: AssemblyKey,
        claimed: PieceKey,
        anchor: PieceKey,
        physics: &mut P,
        scene: &mut S,
    ) -> Result<AssemblyKey>
    where
        P: PhysicsBackend,
        S: SceneGraph + ?Sized,
    {
        let moving = moving_pieces(
            &self.registry,
            key,
            claimed,
            anchor,
            self.config.snap.mate_tolerance,
        );
        let pose = self
            .registry
            .get(key)
            .ok_or(WorkshopError::UnknownAssembly(key))?
            .pose;
        let split = self.registry.add(Assembly::new(pose));
        for &piece in &moving {
            let Some(local) = self.registry.piece(piece).map(|p| p.local) else {
                continue;
            };
            self.registry.transfer_piece(piece, split, local)?;
            scene.attach(NodeRef::Piece(piece), NodeRef::Assembly(split));
        }

        rebuild_body(
            &mut self.registry,
            physics,
            key,
            BodyKind::Kinematic,
            &self.config.body,
        )?;
        rebuild_body(
            &mut self.registry,
            physics,
            split,
            BodyKind::Kinematic,
            &self.config.body,
        )?;
        debug!(from = ?key, into = ?split, moved = moving.len(), "split assembly");
        Ok(split)
    }

    fn hold<P, S>(
        &mut self,
        hand: Hand,
        key: AssemblyKey,
        piece: PieceKey,
        physics: &mut P,
        scene: &mut S,
    ) -> Result<()>
    where
        P: PhysicsBackend,
        S: SceneGraph + ?Sized,
    {
        let assembly = self
            .registry
            .get_mut(key)
            .ok_or(WorkshopError::UnknownAssembly(key))?;
        assembly.holder = Some(hand);
        let pose = assembly.pose;

        let controller = &mut self.controllers[hand];
        controller.held = Some(key);
        controller.piece = Some(piece);
        controller.grip = controller.pose.inverse() * pose;
        controller
            .velocity
            .reset(Point3::from(pose.translation.vector));

        make_kinematic(&mut self.registry, physics, key, &self.config.body)?;
        scene.attach(NodeRef::Assembly(key), NodeRef::Controller(hand));
        show_hand(scene, hand, HandPose::Closed);
        debug!(%hand, assembly = ?key, "grabbed");
        Ok(())
    }

    /// Empty a hand without touching the assembly's body.
    fn drop_grip<S: SceneGraph + ?Sized>(&mut self, hand: Hand, scene: &mut S) {
        let controller = &mut self.controllers[hand];
        let Some(key) = controller.held.take() else {
            return;
        };
        controller.piece = None;
        if let Some(assembly) = self.registry.get_mut(key) {
            if assembly.holder == Some(hand) {
                assembly.holder = None;
            }
        }
        show_hand(scene, hand, HandPose::Open);
    }
}

fn show_hand<S: SceneGraph + ?Sized>(scene: &mut S, hand: Hand, pose: HandPose) {
    if let Some(mesh) = scene.node_by_name(hand.mesh_name()) {
        scene.set_hand_pose(mesh, pose);
    }
}
