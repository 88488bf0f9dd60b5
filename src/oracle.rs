//! Shortest-path teacher.
//!
//! Given a simulator state and a goal viewpoint, picks the primitive
//! action that makes progress along the precomputed shortest path: face
//! the next viewpoint (turn first, then tilt), then move onto it.

use std::f64::consts::{PI, TAU};

use crate::graph::{GraphError, NavGraphStore, Point3};
use crate::sim::{PrimitiveAction, SimState};
use crate::units::view_step;

/// Teacher actions over the paths of a [`NavGraphStore`].
#[derive(Debug, Clone, Copy)]
pub struct ShortestPathOracle<'g> {
    graphs: &'g NavGraphStore,
}

impl<'g> ShortestPathOracle<'g> {
    pub fn new(graphs: &'g NavGraphStore) -> Self {
        Self { graphs }
    }

    /// Next action from `state` toward `goal`.
    ///
    /// Returns the no-op at the goal. If the next viewpoint on the path is
    /// navigable it is centred within one 30° step, horizontally before
    /// vertically, and then moved to. Otherwise the camera is first levelled
    /// and then turned the shorter way toward the next viewpoint's bearing.
    ///
    /// # Errors
    ///
    /// `UnknownScan`, `UnknownViewpoint` or `Unreachable` when the path
    /// tables have no route from the current viewpoint to `goal`.
    pub fn teacher_action(
        &self,
        state: &SimState,
        goal: &str,
    ) -> Result<PrimitiveAction, GraphError> {
        let current = state.viewpoint_id();
        if current == goal {
            return Ok(PrimitiveAction::NOOP);
        }
        let next = self
            .graphs
            .next_hop(&state.scan_id, current, goal)?
            .ok_or_else(|| GraphError::Unreachable {
                scan: state.scan_id.clone(),
                from: current.to_string(),
                to: goal.to_string(),
            })?;

        let band = state.elevation_band();
        let step = view_step();
        if let Some((index, loc)) = state
            .navigable_locations
            .iter()
            .enumerate()
            .find(|(_, loc)| loc.viewpoint_id == next)
        {
            return Ok(if loc.rel_heading > step {
                PrimitiveAction::TURN_RIGHT
            } else if loc.rel_heading < -step {
                PrimitiveAction::TURN_LEFT
            } else if loc.rel_elevation > step && band < 2 {
                PrimitiveAction::LOOK_UP
            } else if loc.rel_elevation < -step && band > 0 {
                PrimitiveAction::LOOK_DOWN
            } else {
                PrimitiveAction::move_to(index)
            });
        }

        match band {
            0 => return Ok(PrimitiveAction::LOOK_UP),
            2 => return Ok(PrimitiveAction::LOOK_DOWN),
            _ => {}
        }
        let target = self.graphs.graph(&state.scan_id)?.position(next)?;
        let bearing = target_heading(state.location.point, target);
        Ok(turn_toward(state.heading, bearing))
    }
}

/// Heading from `from` to `to`, clockwise from `+y`, in `[0, 2π]`.
pub fn target_heading(from: Point3, to: Point3) -> f64 {
    let rel = to - from;
    let heading = PI / 2.0 - rel.y.atan2(rel.x);
    if heading < 0.0 {
        heading + TAU
    } else {
        heading
    }
}

/// Turn that reaches `target` the shorter way round; right on ties.
pub fn turn_toward(heading: f64, target: f64) -> PrimitiveAction {
    let left = (heading > target && heading - target < PI)
        || (target > heading && target - heading > PI);
    if left {
        PrimitiveAction::TURN_LEFT
    } else {
        PrimitiveAction::TURN_RIGHT
    }
}
