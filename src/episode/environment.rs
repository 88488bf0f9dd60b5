//! Batched navigation environment.
//!
//! Couples the task pool, the simulator grid, the feature source and the
//! shortest-path oracle. Episode state lives in the caller's [`Pose`]
//! batches: `step` maps poses to poses and `observe` reads them.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::config::EnvConfig;
use super::error::EpisodeError;
use super::observation::{Observation, ObservationBuilder};
use super::pool::TaskPool;
use super::task::AgentTask;
use crate::features::FeatureSource;
use crate::graph::NavGraphStore;
use crate::sim::{
    Batch, Nesting, Pose, PrimitiveAction, SimulatorBatch, SimulatorFactory, SimulatorSettings,
};
use crate::Id;

/// Scans referenced by `tasks`, for loading the graph store.
pub fn required_scans<'a, I>(tasks: I) -> BTreeSet<Id>
where
    I: IntoIterator<Item = &'a Arc<AgentTask>>,
{
    tasks.into_iter().map(|t| t.scan.clone()).collect()
}

/// N agents (each with up to K beam slots) navigating toward task goals.
///
/// # Lifecycle
///
/// 1. [`NavBatch::new`] validates tasks against the graph store and builds
///    the simulator grid.
/// 2. [`reset`](Self::reset) draws a minibatch and returns start poses.
/// 3. [`observe`](Self::observe) and [`step`](Self::step) alternate on the
///    caller's poses.
pub struct NavBatch<F: SimulatorFactory> {
    config: EnvConfig,
    pool: TaskPool,
    batch: Vec<Arc<AgentTask>>,
    graphs: Arc<NavGraphStore>,
    features: FeatureSource,
    factory: F,
    sims: SimulatorBatch<F::Sim>,
}

impl<F: SimulatorFactory> NavBatch<F> {
    /// Builds the environment.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` or `PoolTooSmall` for unusable sizes
    /// - `EmptyPath` for a task without a path
    /// - `Graph` when a task's scan or path viewpoint is not loaded
    /// - `Sim` when the factory rejects the settings
    pub fn new(
        config: EnvConfig,
        tasks: Vec<Arc<AgentTask>>,
        graphs: Arc<NavGraphStore>,
        features: FeatureSource,
        factory: F,
    ) -> Result<Self, EpisodeError> {
        config.validate()?;
        for task in &tasks {
            if task.path.is_empty() {
                return Err(EpisodeError::EmptyPath {
                    instr_id: task.instr_id.clone(),
                });
            }
            let graph = graphs.graph(&task.scan)?;
            for viewpoint in &task.path {
                graph.require(viewpoint)?;
            }
        }

        let instructions = tasks.len();
        let pool = TaskPool::new(tasks, config.batch_size, config.seed)?;
        let settings = SimulatorSettings::new(features.camera());
        let sims = SimulatorBatch::new(&factory, settings, config.batch_size, config.beam_size)?;

        log::info!(
            "NavBatch loaded with {} instructions, using splits: {}",
            instructions,
            config.splits.join(",")
        );

        Ok(Self {
            config,
            pool,
            batch: Vec::new(),
            graphs,
            features,
            factory,
            sims,
        })
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    pub fn beam_size(&self) -> usize {
        self.config.beam_size
    }

    /// Rebuilds the simulator grid if `beam_size` differs from the current
    /// width. Poses from before the change should not be reused; call
    /// [`reset`](Self::reset) or [`restart`](Self::restart) afterwards.
    pub fn set_beam_size(&mut self, beam_size: usize) -> Result<(), EpisodeError> {
        if beam_size == self.config.beam_size {
            return Ok(());
        }
        if beam_size == 0 {
            return Err(EpisodeError::InvalidConfig("beam_size must be positive".into()));
        }
        self.sims = SimulatorBatch::new(
            &self.factory,
            *self.sims.settings(),
            self.config.batch_size,
            beam_size,
        )?;
        log::info!(
            "beam size changed from {} to {}",
            self.config.beam_size,
            beam_size
        );
        self.config.beam_size = beam_size;
        Ok(())
    }

    /// Draws the next minibatch and starts one episode per agent.
    ///
    /// With `sort`, the minibatch is ordered by descending instruction
    /// length, ties keeping draw order.
    ///
    /// # Errors
    ///
    /// `MissingInstructionLength` when sorting and some pooled task has no
    /// length. Nothing is drawn in that case.
    pub fn reset(&mut self, sort: bool, nesting: Nesting) -> Result<Batch<Pose>, EpisodeError> {
        if sort {
            if let Some(task) = self.pool.tasks().iter().find(|t| t.instr_length.is_none()) {
                return Err(EpisodeError::MissingInstructionLength {
                    instr_id: task.instr_id.clone(),
                });
            }
        }
        let mut batch = self.pool.next_batch();
        log::debug!(
            "drew minibatch of {}, cursor at {}",
            batch.len(),
            self.pool.cursor()
        );
        if sort {
            batch.sort_by_key(|t| std::cmp::Reverse(t.instr_length));
        }
        self.batch = batch;
        self.start_episodes(nesting)
    }

    /// Starts the current minibatch again without drawing a new one.
    pub fn restart(&mut self, nesting: Nesting) -> Result<Batch<Pose>, EpisodeError> {
        if self.batch.is_empty() {
            return Err(EpisodeError::NoBatch);
        }
        self.start_episodes(nesting)
    }

    fn start_episodes(&mut self, nesting: Nesting) -> Result<Batch<Pose>, EpisodeError> {
        let mut scans = Vec::with_capacity(self.batch.len());
        let mut starts = Vec::with_capacity(self.batch.len());
        let mut headings = Vec::with_capacity(self.batch.len());
        for task in &self.batch {
            let start = task.start().ok_or_else(|| EpisodeError::EmptyPath {
                instr_id: task.instr_id.clone(),
            })?;
            scans.push(task.scan.clone());
            starts.push(start.to_string());
            headings.push(task.heading);
        }
        Ok(self.sims.new_episodes(&scans, &starts, &headings, nesting)?)
    }

    /// Rewinds the task pool to the start of the current epoch order.
    pub fn reset_epoch(&mut self) {
        self.pool.reset_epoch();
    }

    /// Applies one primitive action per pose.
    pub fn step(
        &mut self,
        poses: &Batch<Pose>,
        actions: &Batch<PrimitiveAction>,
    ) -> Result<Batch<Pose>, EpisodeError> {
        Ok(self.sims.make_actions(poses, actions)?)
    }

    /// Observations for `poses`, in the same shape.
    ///
    /// Agent `i` is observed against minibatch task `i`.
    pub fn observe(&mut self, poses: &Batch<Pose>) -> Result<Batch<Observation>, EpisodeError> {
        if self.batch.is_empty() {
            return Err(EpisodeError::NoBatch);
        }
        let states = self.sims.get_states(poses)?;
        let builder = ObservationBuilder::new(&self.graphs, &self.features);
        let batch = &self.batch;
        states.try_map(|agent, state| {
            let task = batch.get(agent).ok_or(EpisodeError::NoBatch)?;
            builder.build(agent, task, state)
        })
    }

    /// Current minibatch, in agent order.
    pub fn batch(&self) -> &[Arc<AgentTask>] {
        &self.batch
    }

    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    pub fn graphs(&self) -> &Arc<NavGraphStore> {
        &self.graphs
    }

    pub fn features(&self) -> &FeatureSource {
        &self.features
    }

    /// Direct access to the simulator grid, e.g. for simple actions.
    pub fn simulators_mut(&mut self) -> &mut SimulatorBatch<F::Sim> {
        &mut self.sims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::task::PathId;
    use crate::graph::{GraphError, InMemoryConnectivity, NavGraph, Point3};
    use crate::sim::GraphSimulatorFactory;

    fn graphs() -> Arc<NavGraphStore> {
        let mut g = NavGraph::new("s");
        g.add_viewpoint("a", Point3::new(0.0, 0.0, 1.5)).unwrap();
        g.add_viewpoint("b", Point3::new(0.0, 3.0, 1.5)).unwrap();
        g.connect("a", "b").unwrap();
        Arc::new(NavGraphStore::load(&InMemoryConnectivity::new().with(g), ["s"]).unwrap())
    }

    fn task(id: usize, scan: &str, path: &[&str], len: Option<usize>) -> Arc<AgentTask> {
        Arc::new(AgentTask {
            instr_id: format!("{id}_0"),
            scan: scan.into(),
            path: path.iter().map(|s| s.to_string()).collect(),
            heading: 0.0,
            instructions: String::new(),
            path_id: PathId::Int(id as u64),
            instr_encoding: None,
            instr_length: len,
        })
    }

    fn env(
        tasks: Vec<Arc<AgentTask>>,
        batch_size: usize,
    ) -> Result<NavBatch<GraphSimulatorFactory>, EpisodeError> {
        let graphs = graphs();
        let config = EnvConfig {
            batch_size,
            ..EnvConfig::default()
        };
        NavBatch::new(
            config,
            tasks,
            Arc::clone(&graphs),
            FeatureSource::placeholder(),
            GraphSimulatorFactory::new(graphs),
        )
    }

    #[test]
    fn unknown_scan_rejected_at_construction() {
        let err = env(vec![task(0, "elsewhere", &["a"], None)], 1)
            .err()
            .unwrap();
        assert_eq!(
            err,
            EpisodeError::Graph(GraphError::UnknownScan("elsewhere".into()))
        );
    }

    #[test]
    fn empty_path_rejected_at_construction() {
        let err = env(vec![task(0, "s", &[], None)], 1).err().unwrap();
        assert!(matches!(err, EpisodeError::EmptyPath { .. }));
    }

    #[test]
    fn reset_starts_at_path_heads() {
        let tasks = vec![
            task(0, "s", &["a", "b"], None),
            task(1, "s", &["b", "a"], None),
        ];
        let mut e = env(tasks, 2).unwrap();
        let poses = e.reset(false, Nesting::Flat).unwrap().into_flat().unwrap();
        for (pose, task) in poses.iter().zip(e.batch()) {
            assert_eq!(Some(pose.viewpoint_id.as_str()), task.start());
            assert_eq!(pose.elevation, 0.0);
        }
    }

    #[test]
    fn sort_orders_by_descending_length() {
        let tasks = vec![
            task(0, "s", &["a"], Some(3)),
            task(1, "s", &["a"], Some(9)),
            task(2, "s", &["a"], Some(5)),
        ];
        let mut e = env(tasks, 3).unwrap();
        e.reset(true, Nesting::Flat).unwrap();
        let lengths: Vec<_> = e.batch().iter().map(|t| t.instr_length).collect();
        assert_eq!(lengths, vec![Some(9), Some(5), Some(3)]);
    }

    #[test]
    fn sort_without_lengths_fails() {
        let mut e = env(vec![task(0, "s", &["a"], None)], 1).unwrap();
        assert!(matches!(
            e.reset(true, Nesting::Flat),
            Err(EpisodeError::MissingInstructionLength { .. })
        ));
    }

    #[test]
    fn failed_sorted_reset_draws_nothing() {
        let tasks = vec![
            task(0, "s", &["a"], Some(4)),
            task(1, "s", &["a"], None),
            task(2, "s", &["a"], Some(2)),
            task(3, "s", &["a"], Some(7)),
        ];
        let mut e = env(tasks, 2).unwrap();
        e.reset(false, Nesting::Flat).unwrap();
        let drawn: Vec<_> = e.batch().iter().map(|t| t.instr_id.clone()).collect();
        let cursor = e.pool().cursor();

        assert!(matches!(
            e.reset(true, Nesting::Flat),
            Err(EpisodeError::MissingInstructionLength { .. })
        ));
        assert_eq!(e.pool().cursor(), cursor);
        let kept: Vec<_> = e.batch().iter().map(|t| t.instr_id.clone()).collect();
        assert_eq!(kept, drawn);
    }

    #[test]
    fn observe_before_reset_fails() {
        let mut e = env(vec![task(0, "s", &["a"], None)], 1).unwrap();
        let poses = Batch::Flat(vec![Pose::new("s", "a", 0.0, 0.0)]);
        assert_eq!(e.observe(&poses).unwrap_err(), EpisodeError::NoBatch);
        assert_eq!(e.restart(Nesting::Flat).unwrap_err(), EpisodeError::NoBatch);
    }

    #[test]
    fn restart_keeps_minibatch() {
        let tasks = (0..4).map(|i| task(i, "s", &["a", "b"], None)).collect();
        let mut e = env(tasks, 2).unwrap();
        e.reset(false, Nesting::Flat).unwrap();
        let drawn: Vec<_> = e.batch().iter().map(|t| t.instr_id.clone()).collect();
        e.restart(Nesting::Flat).unwrap();
        let again: Vec<_> = e.batch().iter().map(|t| t.instr_id.clone()).collect();
        assert_eq!(drawn, again);
        assert_eq!(e.pool().cursor(), 2);
    }

    #[test]
    fn set_beam_size_rebuilds_grid() {
        let mut e = env(vec![task(0, "s", &["a", "b"], None)], 1).unwrap();
        e.set_beam_size(3).unwrap();
        assert_eq!(e.beam_size(), 3);
        assert_eq!(e.simulators_mut().beam_size(), 3);
        assert!(e.set_beam_size(0).is_err());
        assert_eq!(e.beam_size(), 3);
    }
}
