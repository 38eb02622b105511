//! Hand controllers as seen by the engine.

use std::collections::VecDeque;
use std::fmt;

use nalgebra::{Point3, Vector3};

use crate::pose::Pose;
use crate::registry::{AssemblyKey, PieceKey};

/// Which hand a controller belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    /// Left hand.
    Left,
    /// Right hand.
    Right,
}

impl Hand {
    /// Both hands, left first.
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    /// The opposite hand.
    pub fn other(self) -> Self {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }

    /// Scene node name of this hand's mesh.
    pub fn mesh_name(self) -> &'static str {
        match self {
            Hand::Left => "left_hand",
            Hand::Right => "right_hand",
        }
    }

    fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Left => f.write_str("left"),
            Hand::Right => f.write_str("right"),
        }
    }
}

/// Estimates motion from a trailing window of world positions.
///
/// Velocity is reported as mean displacement per sample; callers scale it
/// into their own units.
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    samples: VecDeque<Point3<f32>>,
    window: usize,
}

impl VelocityEstimator {
    /// Estimator keeping the last `window` samples.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Forget history and start again from `position`.
    pub fn reset(&mut self, position: Point3<f32>) {
        self.samples.clear();
        self.samples.push_back(position);
    }

    /// Add a sample, dropping the oldest once the window is full.
    pub fn record_position(&mut self, position: Point3<f32>) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(position);
    }

    /// Mean displacement per sample over the window; zero with fewer than two samples.
    pub fn velocity(&self) -> Vector3<f32> {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) if self.samples.len() > 1 => {
                (last - first) / (self.samples.len() - 1) as f32
            }
            _ => Vector3::zeros(),
        }
    }
}

/// Edge detector for an analog grip button.
#[derive(Debug, Clone, Copy, Default)]
pub struct GripButton {
    last: f32,
}

/// A button transition seen this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    /// Crossed the press threshold upwards.
    Pressed,
    /// Returned to rest.
    Released,
}

impl GripButton {
    /// Value above which the button counts as pressed.
    pub const PRESS_THRESHOLD: f32 = 0.5;

    /// Feed this frame's analog value and report any edge.
    pub fn update(&mut self, value: f32) -> Option<ButtonEdge> {
        let last = std::mem::replace(&mut self.last, value);
        if value > Self::PRESS_THRESHOLD && last < Self::PRESS_THRESHOLD {
            Some(ButtonEdge::Pressed)
        } else if value == 0.0 && last != 0.0 {
            Some(ButtonEdge::Released)
        } else {
            None
        }
    }
}

/// One tracked hand.
#[derive(Debug, Clone)]
pub struct Controller {
    /// Handedness.
    pub hand: Hand,
    /// World pose of the grip.
    pub pose: Pose,
    /// Assembly currently held.
    pub held: Option<AssemblyKey>,
    /// Piece the grab landed on.
    pub piece: Option<PieceKey>,
    /// Held assembly's pose relative to the controller.
    pub grip: Pose,
    /// Recent motion of the held assembly.
    pub velocity: VelocityEstimator,
    pub(crate) button: GripButton,
}

impl Controller {
    /// An empty hand at the origin.
    pub fn new(hand: Hand, velocity_window: usize) -> Self {
        Self {
            hand,
            pose: Pose::identity(),
            held: None,
            piece: None,
            grip: Pose::identity(),
            velocity: VelocityEstimator::new(velocity_window),
            button: GripButton::default(),
        }
    }

    /// World position of the grip point.
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.pose.translation.vector)
    }
}

/// The two controllers, indexable by [`Hand`].
#[derive(Debug, Clone)]
pub struct Controllers([Controller; 2]);

impl Controllers {
    /// Both hands, empty.
    pub fn new(velocity_window: usize) -> Self {
        Self([
            Controller::new(Hand::Left, velocity_window),
            Controller::new(Hand::Right, velocity_window),
        ])
    }
}

impl std::ops::Index<Hand> for Controllers {
    type Output = Controller;

    fn index(&self, hand: Hand) -> &Controller {
        &self.0[hand.index()]
    }
}

impl std::ops::IndexMut<Hand> for Controllers {
    fn index_mut(&mut self, hand: Hand) -> &mut Controller {
        &mut self.0[hand.index()]
    }
}
