//! Task pool: seeded shuffling and fixed-size minibatch draws.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::error::EpisodeError;
use super::task::AgentTask;

/// Shuffled tasks with an epoch cursor.
///
/// Draws take consecutive slices of the shuffled order. A draw that runs
/// past the end reshuffles the whole pool and tops the batch up from the
/// front of the new order, leaving the cursor just after the top-up.
#[derive(Debug, Clone)]
pub struct TaskPool {
    tasks: Vec<Arc<AgentTask>>,
    batch_size: usize,
    ix: usize,
    rng: StdRng,
}

impl TaskPool {
    /// Shuffles `tasks` once with `seed`.
    ///
    /// # Errors
    ///
    /// `PoolTooSmall` unless `0 < batch_size <= tasks.len()`.
    pub fn new(
        mut tasks: Vec<Arc<AgentTask>>,
        batch_size: usize,
        seed: u64,
    ) -> Result<Self, EpisodeError> {
        if batch_size == 0 || tasks.len() < batch_size {
            return Err(EpisodeError::PoolTooSmall {
                available: tasks.len(),
                batch_size,
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        tasks.shuffle(&mut rng);
        Ok(Self {
            tasks,
            batch_size,
            ix: 0,
            rng,
        })
    }

    /// Draws the next minibatch.
    pub fn next_batch(&mut self) -> Vec<Arc<AgentTask>> {
        let end = (self.ix + self.batch_size).min(self.tasks.len());
        let mut batch = self.tasks[self.ix..end].to_vec();
        if batch.len() < self.batch_size {
            self.tasks.shuffle(&mut self.rng);
            self.ix = self.batch_size - batch.len();
            batch.extend_from_slice(&self.tasks[..self.ix]);
            log::debug!("task pool wrapped, reshuffled {} tasks", self.tasks.len());
        } else {
            self.ix += self.batch_size;
        }
        batch
    }

    /// Rewinds the cursor without reshuffling.
    pub fn reset_epoch(&mut self) {
        self.ix = 0;
    }

    pub fn cursor(&self) -> usize {
        self.ix
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in current shuffled order.
    pub fn tasks(&self) -> &[Arc<AgentTask>] {
        &self.tasks
    }
}
