//! Discrete action vocabulary.
//!
//! The simulator accepts a primitive `(index, heading, elevation)` triple.
//! Policies usually speak the five-way simple vocabulary, which maps onto
//! primitive triples through [`SimpleAction::primitive`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::SimError;

/// One primitive simulator action.
///
/// `index > 0` moves to that navigable location; otherwise `heading` and
/// `elevation` turn and tilt the camera by one 30° step each (−1, 0, 1).
/// Callers set at most one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrimitiveAction {
    pub index: usize,
    pub heading: i32,
    pub elevation: i32,
}

impl PrimitiveAction {
    pub const NOOP: Self = Self::new(0, 0, 0);
    pub const TURN_LEFT: Self = Self::new(0, -1, 0);
    pub const TURN_RIGHT: Self = Self::new(0, 1, 0);
    pub const LOOK_UP: Self = Self::new(0, 0, 1);
    pub const LOOK_DOWN: Self = Self::new(0, 0, -1);

    pub const fn new(index: usize, heading: i32, elevation: i32) -> Self {
        Self {
            index,
            heading,
            elevation,
        }
    }

    /// Move to navigable location `index`.
    pub const fn move_to(index: usize) -> Self {
        Self::new(index, 0, 0)
    }

    pub fn is_noop(&self) -> bool {
        *self == Self::NOOP
    }

    pub fn is_move(&self) -> bool {
        self.index > 0
    }

    pub fn as_tuple(&self) -> (usize, i32, i32) {
        (self.index, self.heading, self.elevation)
    }
}

impl From<(usize, i32, i32)> for PrimitiveAction {
    fn from((index, heading, elevation): (usize, i32, i32)) -> Self {
        Self::new(index, heading, elevation)
    }
}

impl fmt::Display for PrimitiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.index, self.heading, self.elevation)
    }
}

/// The five-way simple action interface.
///
/// Forward always targets navigable location 1, the nearest location to
/// the view centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SimpleAction {
    Forward,
    TurnLeft,
    TurnRight,
    LookUp,
    LookDown,
}

impl SimpleAction {
    pub fn all() -> [SimpleAction; 5] {
        [
            SimpleAction::Forward,
            SimpleAction::TurnLeft,
            SimpleAction::TurnRight,
            SimpleAction::LookUp,
            SimpleAction::LookDown,
        ]
    }

    pub fn index(&self) -> usize {
        match self {
            SimpleAction::Forward => 0,
            SimpleAction::TurnLeft => 1,
            SimpleAction::TurnRight => 2,
            SimpleAction::LookUp => 3,
            SimpleAction::LookDown => 4,
        }
    }

    pub fn primitive(&self) -> PrimitiveAction {
        match self {
            SimpleAction::Forward => PrimitiveAction::move_to(1),
            SimpleAction::TurnLeft => PrimitiveAction::TURN_LEFT,
            SimpleAction::TurnRight => PrimitiveAction::TURN_RIGHT,
            SimpleAction::LookUp => PrimitiveAction::LOOK_UP,
            SimpleAction::LookDown => PrimitiveAction::LOOK_DOWN,
        }
    }
}

impl TryFrom<usize> for SimpleAction {
    type Error = SimError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(SimpleAction::Forward),
            1 => Ok(SimpleAction::TurnLeft),
            2 => Ok(SimpleAction::TurnRight),
            3 => Ok(SimpleAction::LookUp),
            4 => Ok(SimpleAction::LookDown),
            other => Err(SimError::InvalidSimpleAction(other)),
        }
    }
}
