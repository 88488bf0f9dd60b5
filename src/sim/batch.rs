//! Batch-shaped facade over a grid of simulator instances.

use super::action::{PrimitiveAction, SimpleAction};
use super::error::SimError;
use super::nested::{structured_map, Batch, Nesting};
use super::simulator::{Simulator, SimulatorFactory};
use super::state::{Pose, SimState, SimulatorSettings};
use crate::Id;

/// `batch_size × beam_size` simulators behind batch-shaped operations.
///
/// Simulators are reused as pose → state evaluators: every query and action
/// first loads the caller's pose into the instance, so no instance carries
/// meaning between calls.
///
/// # Lifecycle
///
/// 1. [`SimulatorBatch::new`] creates every instance up front.
/// 2. [`new_episodes`](Self::new_episodes) loads beam slot 0 of each agent.
/// 3. [`get_states`](Self::get_states) and [`make_actions`](Self::make_actions)
///    take explicit poses and may address any beam slot.
#[derive(Debug)]
pub struct SimulatorBatch<S: Simulator> {
    sims: Vec<Vec<S>>,
    settings: SimulatorSettings,
}

impl<S: Simulator> SimulatorBatch<S> {
    /// Creates `batch_size` rows of `beam_size` simulators each.
    pub fn new<F>(
        factory: &F,
        settings: SimulatorSettings,
        batch_size: usize,
        beam_size: usize,
    ) -> Result<Self, SimError>
    where
        F: SimulatorFactory<Sim = S> + ?Sized,
    {
        if batch_size == 0 || beam_size == 0 {
            return Err(SimError::Config(format!(
                "batch size ({batch_size}) and beam size ({beam_size}) must be positive"
            )));
        }
        let sims = (0..batch_size)
            .map(|_| {
                (0..beam_size)
                    .map(|_| factory.create(&settings))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sims, settings })
    }

    pub fn batch_size(&self) -> usize {
        self.sims.len()
    }

    pub fn beam_size(&self) -> usize {
        self.sims.first().map_or(0, Vec::len)
    }

    pub fn settings(&self) -> &SimulatorSettings {
        &self.settings
    }

    /// Starts one episode per agent at elevation 0.
    ///
    /// Only beam slot 0 is loaded. Beamed output wraps each pose in a beam
    /// of length one.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` unless all three inputs have `batch_size` entries.
    pub fn new_episodes(
        &mut self,
        scan_ids: &[Id],
        viewpoint_ids: &[Id],
        headings: &[f64],
        nesting: Nesting,
    ) -> Result<Batch<Pose>, SimError> {
        for len in [scan_ids.len(), viewpoint_ids.len(), headings.len()] {
            if len != self.sims.len() {
                return Err(SimError::ShapeMismatch {
                    expected: self.sims.len(),
                    actual: len,
                });
            }
        }

        let mut poses = Vec::with_capacity(self.sims.len());
        for (row, ((scan, viewpoint), &heading)) in self
            .sims
            .iter_mut()
            .zip(scan_ids.iter().zip(viewpoint_ids).zip(headings))
        {
            let pose = Pose::new(scan.clone(), viewpoint.clone(), heading, 0.0);
            row[0].load_pose(&pose)?;
            poses.push(pose);
        }
        Ok(Batch::from_agents(nesting, poses))
    }

    /// Loads each pose into its simulator and reads back the full state.
    pub fn get_states(&mut self, poses: &Batch<Pose>) -> Result<Batch<SimState>, SimError> {
        structured_map(&mut self.sims, poses, |sim, pose| {
            sim.load_pose(pose)?;
            sim.state()
        })
    }

    /// Applies one primitive action per pose and returns the resulting poses.
    pub fn make_actions(
        &mut self,
        poses: &Batch<Pose>,
        actions: &Batch<PrimitiveAction>,
    ) -> Result<Batch<Pose>, SimError> {
        let pairs = poses.zip(actions)?;
        structured_map(&mut self.sims, &pairs, |sim, (pose, action)| {
            sim.load_pose(pose)?;
            sim.make_action(**action)?;
            sim.pose()
        })
    }

    /// Applies simple actions to the simulators' current poses.
    ///
    /// All indices are validated before any simulator is touched.
    ///
    /// # Errors
    ///
    /// `InvalidSimpleAction` for any index outside `0..=4`.
    pub fn make_simple_actions(&mut self, simple_indices: &Batch<usize>) -> Result<(), SimError> {
        let actions = simple_indices.try_map(|_, &index| SimpleAction::try_from(index))?;
        structured_map(&mut self.sims, &actions, |sim, action| {
            sim.make_action(action.primitive())
        })?;
        Ok(())
    }

    /// Current poses of every simulator, bypassing pose loading.
    pub fn current_poses(&self, nesting: Nesting) -> Result<Batch<Pose>, SimError> {
        match nesting {
            Nesting::Flat => self
                .sims
                .iter()
                .map(|row| row[0].pose())
                .collect::<Result<_, _>>()
                .map(Batch::Flat),
            Nesting::Beamed => self
                .sims
                .iter()
                .map(|row| row.iter().map(Simulator::pose).collect::<Result<Vec<_>, _>>())
                .collect::<Result<_, _>>()
                .map(Batch::Beamed),
        }
    }
}
