//! Per-agent observations.
//!
//! One [`Observation`] per agent (or per beam slot) combines the
//! simulator state, the view's features, the instruction and the teacher
//! action toward the task goal.

use crate::features::{FeatureSource, FeatureVector};
use crate::graph::NavGraphStore;
use crate::oracle::ShortestPathOracle;
use crate::sim::{NavigableLocation, PrimitiveAction, SimState};
use crate::Id;

use super::error::EpisodeError;
use super::task::AgentTask;

/// What an agent sees after reset or a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub instr_id: String,
    pub scan: Id,
    pub viewpoint: Id,
    pub view_index: usize,
    pub heading: f64,
    pub elevation: f64,
    pub feature: FeatureVector,
    pub step: u32,
    /// Index 0 is the current viewpoint.
    pub navigable_locations: Vec<NavigableLocation>,
    pub instructions: String,
    pub instr_encoding: Option<Vec<usize>>,
    pub instr_length: Option<usize>,
    /// Shortest-path action toward the task goal.
    pub teacher: PrimitiveAction,
}

/// Builds observations against a shared graph store and feature source.
pub struct ObservationBuilder<'a> {
    features: &'a FeatureSource,
    oracle: ShortestPathOracle<'a>,
}

impl<'a> ObservationBuilder<'a> {
    pub fn new(graphs: &'a NavGraphStore, features: &'a FeatureSource) -> Self {
        Self {
            features,
            oracle: ShortestPathOracle::new(graphs),
        }
    }

    /// Observation of `state` for agent `agent` working on `task`.
    ///
    /// # Errors
    ///
    /// - `ScanMismatch` if the state is not in the task's scan
    /// - `EmptyPath` if the task has no goal
    /// - feature or path lookup failures
    pub fn build(
        &self,
        agent: usize,
        task: &AgentTask,
        state: &SimState,
    ) -> Result<Observation, EpisodeError> {
        if task.scan != state.scan_id {
            return Err(EpisodeError::ScanMismatch {
                agent,
                instr_id: task.instr_id.clone(),
                task_scan: task.scan.clone(),
                state_scan: state.scan_id.clone(),
            });
        }
        let goal = task.goal().ok_or_else(|| EpisodeError::EmptyPath {
            instr_id: task.instr_id.clone(),
        })?;

        Ok(Observation {
            instr_id: task.instr_id.clone(),
            scan: state.scan_id.clone(),
            viewpoint: state.viewpoint_id().to_string(),
            view_index: state.view_index,
            heading: state.heading,
            elevation: state.elevation,
            feature: self.features.for_state(state)?,
            step: state.step,
            navigable_locations: state.navigable_locations.clone(),
            instructions: task.instructions.clone(),
            instr_encoding: task.instr_encoding.clone(),
            instr_length: task.instr_length,
            teacher: self.oracle.teacher_action(state, goal)?,
        })
    }
}
