//! Scene graph collaborator interface.
//!
//! The engine keeps the authoritative grouping in the
//! [`Registry`](crate::registry::Registry); the scene graph only mirrors it so
//! a renderer can draw pieces where they are. Every structural change is
//! reported as attach/detach calls.

use crate::controller::Hand;
use crate::pose::Pose;
use crate::registry::{AssemblyKey, PieceKey};

/// A node the engine knows how to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// The scene root.
    Root,
    /// A controller's grip node.
    Controller(Hand),
    /// The hand mesh shown at a controller.
    HandMesh(Hand),
    /// An assembly's group node.
    Assembly(AssemblyKey),
    /// A piece's mesh node.
    Piece(PieceKey),
}

/// Hand mesh pose to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandPose {
    /// Fingers open.
    Open,
    /// Fist around a grabbed piece.
    Closed,
}

/// Scene graph operations the engine issues.
///
/// `()` implements this as a no-op, for headless use.
pub trait SceneGraph {
    /// Put `node` under `parent`, reparenting it if it already exists.
    fn attach(&mut self, node: NodeRef, parent: NodeRef);

    /// Remove `node` from the graph.
    fn detach(&mut self, node: NodeRef);

    /// World transform of a node, if the graph tracks one.
    fn world_pose(&self, _node: NodeRef) -> Option<Pose> {
        None
    }

    /// Find a node by name, e.g. a hand mesh.
    fn node_by_name(&self, _name: &str) -> Option<NodeRef> {
        None
    }

    /// Show a hand mesh open or closed.
    fn set_hand_pose(&mut self, _hand_mesh: NodeRef, _pose: HandPose) {}
}

impl SceneGraph for () {
    fn attach(&mut self, _node: NodeRef, _parent: NodeRef) {}

    fn detach(&mut self, _node: NodeRef) {}
}

/// Scene graph that records every call, for tests and replay logs.
#[derive(Debug, Default, Clone)]
pub struct SceneLog {
    /// Calls in the order they were made.
    pub events: Vec<SceneEvent>,
}

/// One recorded scene call.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// `attach(node, parent)`.
    Attach(NodeRef, NodeRef),
    /// `detach(node)`.
    Detach(NodeRef),
    /// `set_hand_pose(hand, pose)`.
    HandPose(Hand, HandPose),
}

impl SceneGraph for SceneLog {
    fn attach(&mut self, node: NodeRef, parent: NodeRef) {
        self.events.push(SceneEvent::Attach(node, parent));
    }

    fn detach(&mut self, node: NodeRef) {
        self.events.push(SceneEvent::Detach(node));
    }

    fn node_by_name(&self, name: &str) -> Option<NodeRef> {
        Hand::ALL
            .into_iter()
            .find(|h| h.mesh_name() == name)
            .map(NodeRef::HandMesh)
    }

    fn set_hand_pose(&mut self, hand_mesh: NodeRef, pose: HandPose) {
        if let NodeRef::HandMesh(hand) = hand_mesh {
            self.events.push(SceneEvent::HandPose(hand, pose));
        }
    }
}

impl SceneLog {
    /// Last parent an `attach` gave to `node`, unless it was detached afterwards.
    pub fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        let mut parent = None;
        for event in &self.events {
            match event {
                SceneEvent::Attach(n, p) if *n == node => parent = Some(*p),
                SceneEvent::Detach(n) if *n == node => parent = None,
                _ => {}
            }
        }
        parent
    }
}
