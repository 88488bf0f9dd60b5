//! Shortest-path teacher policy.

use super::trait_::Policy;
use crate::episode::Observation;
use crate::sim::PrimitiveAction;

/// Follows the oracle action carried in every observation.
///
/// Upper-bound baseline: it always stops exactly at the goal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeacherPolicy;

impl TeacherPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Policy for TeacherPolicy {
    fn select_actions(&mut self, observations: &[Observation]) -> Vec<PrimitiveAction> {
        observations.iter().map(|ob| ob.teacher).collect()
    }

    fn name(&self) -> &str {
        "teacher"
    }
}
