//! Batched episode management: tasks, minibatch sampling, reset, step and
//! observe.

pub mod config;
pub mod error;
pub mod task;

#[cfg(feature = "serde")]
pub mod dataset;

mod environment;
mod observation;
mod pool;

#[cfg(test)]
mod tests;

pub use config::EnvConfig;
pub use environment::{required_scans, NavBatch};
pub use error::EpisodeError;
pub use observation::{Observation, ObservationBuilder};
pub use pool::TaskPool;
pub use task::{mint_tasks, AgentTask, PathId, PathRecord, Tokenizer};

#[cfg(feature = "serde")]
pub use dataset::{load_datasets, load_split, DatasetError};
