//! Geometry shared by the navigation graph and the simulator.

use std::fmt;
use std::ops::Sub;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::units::wrap_heading;

/// A 3D position in scan coordinates (metres, `z` up).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point3) -> f64 {
        let d = *other - *self;
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }

    /// Distance to another point projected onto the horizontal plane.
    pub fn horizontal_distance_to(&self, other: &Point3) -> f64 {
        let d = *other - *self;
        (d.x * d.x + d.y * d.y).sqrt()
    }

    /// Absolute bearing from `self` toward `target`.
    ///
    /// Measured clockwise from north (`+y`) and normalized to `[0, 2π)`,
    /// matching the simulator heading convention.
    pub fn bearing_to(&self, target: &Point3) -> f64 {
        let d = *target - *self;
        wrap_heading(d.x.atan2(d.y))
    }

    /// Elevation angle from `self` toward `target` (positive = above).
    pub fn elevation_to(&self, target: &Point3) -> f64 {
        let dz = target.z - self.z;
        dz.atan2(self.horizontal_distance_to(target))
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}
