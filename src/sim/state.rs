//! Poses, simulator states and camera settings.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::Point3;
use crate::units::HEADING_COUNT;
use crate::Id;

/// Snapshot of where an agent is and where its camera points.
///
/// Poses are values: every step produces a new one, nothing mutates an
/// existing pose.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    pub scan_id: Id,
    pub viewpoint_id: Id,
    /// Radians, 0 = north, increasing clockwise.
    pub heading: f64,
    /// Radians, positive = looking up.
    pub elevation: f64,
}

impl Pose {
    pub fn new(
        scan_id: impl Into<Id>,
        viewpoint_id: impl Into<Id>,
        heading: f64,
        elevation: f64,
    ) -> Self {
        Self {
            scan_id: scan_id.into(),
            viewpoint_id: viewpoint_id.into(),
            heading,
            elevation,
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (heading {:.3}, elevation {:.3})",
            self.scan_id, self.viewpoint_id, self.heading, self.elevation
        )
    }
}

/// A viewpoint reachable from the current pose, as seen from it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavigableLocation {
    pub viewpoint_id: Id,
    /// Signed angle from the current heading (positive = to the right).
    pub rel_heading: f64,
    /// Signed angle from the current elevation (positive = above).
    pub rel_elevation: f64,
    pub point: Point3,
}

/// Full simulator state after loading a pose or taking an action.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimState {
    pub scan_id: Id,
    /// The current viewpoint, with zero relative angles.
    pub location: NavigableLocation,
    pub heading: f64,
    pub elevation: f64,
    /// Discretized view, `elevation_band * 12 + heading_index`.
    pub view_index: usize,
    pub step: u32,
    /// Index 0 is always the current viewpoint.
    pub navigable_locations: Vec<NavigableLocation>,
}

impl SimState {
    pub fn viewpoint_id(&self) -> &str {
        &self.location.viewpoint_id
    }

    /// Camera elevation band: 0 = down, 1 = level, 2 = up.
    pub fn elevation_band(&self) -> usize {
        self.view_index / HEADING_COUNT
    }

    pub fn pose(&self) -> Pose {
        Pose::new(
            self.scan_id.clone(),
            self.location.viewpoint_id.clone(),
            self.heading,
            self.elevation,
        )
    }
}

/// Camera geometry shared by every simulator instance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub vfov_degrees: f64,
}

impl CameraConfig {
    /// Horizontal field of view in radians, derived from the aspect ratio.
    pub fn hfov(&self) -> f64 {
        let half_v = crate::units::degrees_to_radians(self.vfov_degrees) / 2.0;
        let aspect = self.width as f64 / self.height as f64;
        2.0 * (half_v.tan() * aspect).atan()
    }

    /// Vertical field of view in radians.
    pub fn vfov(&self) -> f64 {
        crate::units::degrees_to_radians(self.vfov_degrees)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            vfov_degrees: 60.0,
        }
    }
}

/// Settings applied to each simulator when it is created.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulatorSettings {
    pub camera: CameraConfig,
    pub discretized_viewing: bool,
    pub rendering: bool,
}

impl SimulatorSettings {
    pub fn new(camera: CameraConfig) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            discretized_viewing: true,
            rendering: false,
        }
    }
}
