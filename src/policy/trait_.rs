//! Policy trait for the navigation environment.

use crate::episode::Observation;
use crate::sim::PrimitiveAction;

/// A policy that selects one primitive action per agent.
///
/// Returning [`PrimitiveAction::NOOP`] for an agent ends its episode.
pub trait Policy: Send + Sync {
    /// Selects one action per agent given their observations.
    ///
    /// # Arguments
    ///
    /// * `observations` - Per-agent observations (from [`NavBatch::observe`](crate::episode::NavBatch::observe))
    fn select_actions(&mut self, observations: &[Observation]) -> Vec<PrimitiveAction>;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
