//! Rollouts and evaluation metrics for navigation policies.
//!
//! A rollout drives one minibatch until every agent stops (no-op) or the
//! step limit is hit. Scoring compares each final viewpoint with the task
//! goal by shortest-path distance.

use std::fmt;

use crate::episode::{EpisodeError, NavBatch};
use crate::graph::{GraphError, NavGraphStore};
use crate::policy::Policy;
use crate::sim::{Batch, Nesting, PrimitiveAction, SimulatorFactory};
use crate::Id;

/// Distance to the goal, in metres, under which an episode succeeds.
pub const SUCCESS_RADIUS: f64 = 3.0;

/// Viewpoints visited by one agent during a rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub instr_id: String,
    pub scan: Id,
    pub goal: Id,
    /// Visited viewpoints, start first. Consecutive duplicates are collapsed.
    pub path: Vec<Id>,
    /// Actions taken before stopping.
    pub steps: u32,
    /// Whether the agent issued a no-op before the step limit.
    pub stopped: bool,
}

impl Trajectory {
    pub fn final_viewpoint(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }
}

/// Runs `policy` on the next minibatch for at most `max_steps` steps.
pub fn rollout<F: SimulatorFactory>(
    env: &mut NavBatch<F>,
    policy: &mut dyn Policy,
    max_steps: u32,
) -> Result<Vec<Trajectory>, EpisodeError> {
    let mut poses = env.reset(false, Nesting::Flat)?;
    let mut trajectories: Vec<Trajectory> = env
        .batch()
        .iter()
        .zip(poses.iter())
        .map(|(task, pose)| Trajectory {
            instr_id: task.instr_id.clone(),
            scan: task.scan.clone(),
            goal: task.goal().unwrap_or_default().to_string(),
            path: vec![pose.viewpoint_id.clone()],
            steps: 0,
            stopped: false,
        })
        .collect();

    for _ in 0..max_steps {
        if trajectories.iter().all(|t| t.stopped) {
            break;
        }
        let observations = env.observe(&poses)?.into_flat().unwrap_or_default();
        let mut actions = policy.select_actions(&observations);
        actions.resize(trajectories.len(), PrimitiveAction::NOOP);
        for (action, trajectory) in actions.iter_mut().zip(&mut trajectories) {
            if trajectory.stopped || action.is_noop() {
                trajectory.stopped = true;
                *action = PrimitiveAction::NOOP;
            } else {
                trajectory.steps += 1;
            }
        }

        poses = env.step(&poses, &Batch::Flat(actions))?;
        for (pose, trajectory) in poses.iter().zip(&mut trajectories) {
            if trajectory.path.last() != Some(&pose.viewpoint_id) {
                trajectory.path.push(pose.viewpoint_id.clone());
            }
        }
    }
    Ok(trajectories)
}

/// Aggregated evaluation metrics over many trajectories.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    /// Mean shortest-path distance from the final viewpoint to the goal.
    pub mean_nav_error: f64,
    /// Fraction of episodes ending within [`SUCCESS_RADIUS`] of the goal.
    pub success_rate: f64,
    /// Fraction of episodes passing within [`SUCCESS_RADIUS`] at any point.
    pub oracle_success_rate: f64,
    /// Mean distance travelled.
    pub mean_trajectory_length: f64,
    /// Mean number of actions per episode.
    pub mean_steps: f64,
    /// Number of episodes evaluated.
    pub n_episodes: usize,
}

impl EvaluationMetrics {
    /// Evaluates a policy over `n_batches` minibatches.
    ///
    /// # Arguments
    ///
    /// * `env` - The environment to draw minibatches from
    /// * `policy` - The policy to evaluate
    /// * `n_batches` - Number of minibatches to roll out
    /// * `max_steps` - Step limit per rollout
    pub fn evaluate<F: SimulatorFactory>(
        env: &mut NavBatch<F>,
        policy: &mut dyn Policy,
        n_batches: usize,
        max_steps: u32,
    ) -> Result<Self, EpisodeError> {
        let mut trajectories = Vec::new();
        for _ in 0..n_batches {
            trajectories.extend(rollout(env, policy, max_steps)?);
        }
        Ok(Self::score(env.graphs(), &trajectories)?)
    }

    /// Scores finished trajectories against their goals.
    pub fn score(graphs: &NavGraphStore, trajectories: &[Trajectory]) -> Result<Self, GraphError> {
        if trajectories.is_empty() {
            return Ok(Self::empty());
        }

        let mut nav_error = 0.0;
        let mut successes = 0usize;
        let mut oracle_successes = 0usize;
        let mut length = 0.0;
        let mut steps = 0u64;

        for t in trajectories {
            let to_goal = |vp: &str| graphs.distance(&t.scan, vp, &t.goal);
            let final_error = to_goal(t.final_viewpoint())?;
            let closest = t
                .path
                .iter()
                .map(|vp| to_goal(vp.as_str()))
                .collect::<Result<Vec<f64>, _>>()?
                .into_iter()
                .fold(f64::INFINITY, f64::min);
            let travelled = t
                .path
                .windows(2)
                .map(|w| graphs.distance(&t.scan, &w[0], &w[1]))
                .sum::<Result<f64, _>>()?;

            nav_error += final_error;
            length += travelled;
            steps += u64::from(t.steps);
            if final_error < SUCCESS_RADIUS {
                successes += 1;
            }
            if closest < SUCCESS_RADIUS {
                oracle_successes += 1;
            }
        }

        let n = trajectories.len() as f64;
        Ok(Self {
            mean_nav_error: nav_error / n,
            success_rate: successes as f64 / n,
            oracle_success_rate: oracle_successes as f64 / n,
            mean_trajectory_length: length / n,
            mean_steps: steps as f64 / n,
            n_episodes: trajectories.len(),
        })
    }

    fn empty() -> Self {
        Self {
            mean_nav_error: 0.0,
            success_rate: 0.0,
            oracle_success_rate: 0.0,
            mean_trajectory_length: 0.0,
            mean_steps: 0.0,
            n_episodes: 0,
        }
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} episodes) ===",
            self.n_episodes
        )?;
        writeln!(f, "  Navigation error:        {:.2} m", self.mean_nav_error)?;
        writeln!(
            f,
            "  Success rate:            {:.1}%",
            self.success_rate * 100.0
        )?;
        writeln!(
            f,
            "  Oracle success rate:     {:.1}%",
            self.oracle_success_rate * 100.0
        )?;
        writeln!(
            f,
            "  Trajectory length:       {:.2} m",
            self.mean_trajectory_length
        )?;
        writeln!(f, "  Mean steps:              {:.1}", self.mean_steps)
    }
}
