//! Simulator contract.

use super::action::PrimitiveAction;
use super::error::SimError;
use super::state::{Pose, SimState, SimulatorSettings};

/// One simulator instance.
///
/// Instances are used as pose-addressed evaluators: the facade loads a pose
/// with [`new_episode`](Self::new_episode) before every query or action, so
/// implementations need not keep anything beyond the current pose.
pub trait Simulator {
    /// Places the agent at a pose and resets the step counter.
    fn new_episode(
        &mut self,
        scan_id: &str,
        viewpoint_id: &str,
        heading: f64,
        elevation: f64,
    ) -> Result<(), SimError>;

    /// Applies one primitive action to the current pose.
    fn make_action(&mut self, action: PrimitiveAction) -> Result<(), SimError>;

    /// Full state at the current pose.
    fn state(&self) -> Result<SimState, SimError>;

    /// Loads a [`Pose`] as a new episode.
    fn load_pose(&mut self, pose: &Pose) -> Result<(), SimError> {
        self.new_episode(
            &pose.scan_id,
            &pose.viewpoint_id,
            pose.heading,
            pose.elevation,
        )
    }

    /// The current pose.
    fn pose(&self) -> Result<Pose, SimError> {
        self.state().map(|s| s.pose())
    }
}

/// Creates configured simulator instances.
pub trait SimulatorFactory {
    type Sim: Simulator;

    fn create(&self, settings: &SimulatorSettings) -> Result<Self::Sim, SimError>;
}
