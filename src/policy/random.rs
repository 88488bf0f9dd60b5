//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::trait_::Policy;
use crate::episode::Observation;
use crate::sim::{PrimitiveAction, SimpleAction};

/// Uniformly random simple actions.
///
/// Each agent independently picks one of the five simple actions. Forward
/// with nothing in view turns right instead. Never stops on its own, so
/// rollouts end at the step limit.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a new random policy with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_actions(&mut self, observations: &[Observation]) -> Vec<PrimitiveAction> {
        let choices = SimpleAction::all();
        observations
            .iter()
            .map(|ob| {
                let action = choices
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(SimpleAction::TurnRight);
                match action {
                    SimpleAction::Forward if ob.navigable_locations.len() < 2 => {
                        PrimitiveAction::TURN_RIGHT
                    }
                    other => other.primitive(),
                }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}
