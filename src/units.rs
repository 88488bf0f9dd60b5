//! Angle handling for the discretized viewing grid.
//!
//! Headings and elevations travel through the crate as plain `f64` radians,
//! the convention the simulator contract uses. Constants that are naturally
//! stated in degrees (the 30° view step, the camera field of view) are
//! converted through `qtty` so the degree → radian step is checked at the
//! type level rather than hand-multiplied.

use std::f64::consts::{PI, TAU};

use qtty::{Degree, Quantity, Radian, Unit};

/// Number of discrete headings around the panorama (30° apart).
pub const HEADING_COUNT: usize = 12;

/// Number of discrete camera elevation bands (down, level, up).
pub const ELEVATION_COUNT: usize = 3;

/// Total number of discretized views per viewpoint.
pub const VIEW_COUNT: usize = HEADING_COUNT * ELEVATION_COUNT;

/// Size of one heading or elevation step, in degrees.
pub const VIEW_STEP_DEGREES: f64 = 30.0;

/// Marker trait for units that share the same physical dimension.
///
/// Automatically implemented for any pair of units where
/// `From::Dim == To::Dim`.
pub trait SameDim<To: Unit>: Unit<Dim = To::Dim> {}

impl<From, To> SameDim<To> for From
where
    From: Unit,
    To: Unit<Dim = From::Dim>,
{
}

/// Converts a quantity from one unit to another unit of the same dimension.
#[inline]
pub const fn convert<From, To>(q: Quantity<From>) -> Quantity<To>
where
    From: SameDim<To>,
    To: Unit,
{
    q.to_const::<To>()
}

/// Converts a raw degree value to radians.
#[inline]
pub fn degrees_to_radians(degrees: f64) -> f64 {
    convert::<Degree, Radian>(Quantity::new(degrees)).value()
}

/// Converts a raw radian value to degrees.
#[inline]
pub fn radians_to_degrees(radians: f64) -> f64 {
    convert::<Radian, Degree>(Quantity::new(radians)).value()
}

/// One discretized turn or tilt, in radians.
#[inline]
pub fn view_step() -> f64 {
    degrees_to_radians(VIEW_STEP_DEGREES)
}

/// Wraps a heading into `[0, 2π)`.
pub fn wrap_heading(heading: f64) -> f64 {
    let wrapped = heading.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Wraps a signed angle difference into `(-π, π]`.
pub fn wrap_relative(angle: f64) -> f64 {
    let wrapped = wrap_heading(angle);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Index of the discrete heading nearest to `heading` (0..12).
pub fn heading_index(heading: f64) -> usize {
    let steps = (wrap_heading(heading) / view_step()).round() as usize;
    steps % HEADING_COUNT
}

/// Elevation band for an elevation angle: 0 = down, 1 = level, 2 = up.
pub fn elevation_band(elevation: f64) -> usize {
    let steps = (elevation / view_step()).round() as i64 + 1;
    steps.clamp(0, ELEVATION_COUNT as i64 - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_step_is_a_twelfth_of_a_turn() {
        assert!((view_step() * HEADING_COUNT as f64 - TAU).abs() < 1e-12);
        assert!((view_step() - PI / 6.0).abs() < 1e-12);
    }

    #[test]
    fn degrees_round_trip() {
        let r = degrees_to_radians(60.0);
        assert!((radians_to_degrees(r) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn wrap_heading_handles_negative_and_overflow() {
        assert!((wrap_heading(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((wrap_heading(TAU + 0.25) - 0.25).abs() < 1e-12);
        assert_eq!(wrap_heading(0.0), 0.0);
        assert!(wrap_heading(-1e-18) < TAU);
    }

    #[test]
    fn wrap_relative_picks_shorter_side() {
        assert!((wrap_relative(1.75 * PI) + 0.25 * PI).abs() < 1e-12);
        assert!((wrap_relative(-1.75 * PI) - 0.25 * PI).abs() < 1e-12);
        assert!((wrap_relative(PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn heading_index_rounds_and_wraps() {
        assert_eq!(heading_index(0.0), 0);
        assert_eq!(heading_index(view_step() * 3.0 + 0.1), 3);
        assert_eq!(heading_index(TAU - 0.01), 0);
        assert_eq!(heading_index(-view_step()), 11);
    }

    #[test]
    fn elevation_band_clamps() {
        assert_eq!(elevation_band(0.0), 1);
        assert_eq!(elevation_band(-view_step()), 0);
        assert_eq!(elevation_band(view_step()), 2);
        assert_eq!(elevation_band(PI / 2.0), 2);
        assert_eq!(elevation_band(-PI / 2.0), 0);
    }
}
