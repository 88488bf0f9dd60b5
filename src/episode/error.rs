use thiserror::Error;

use crate::features::FeatureError;
use crate::graph::GraphError;
use crate::sim::SimError;
use crate::Id;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EpisodeError {
    #[error("Invalid environment config: {0}")]
    InvalidConfig(String),

    #[error("Task pool holds {available} tasks but the batch needs {batch_size}")]
    PoolTooSmall { available: usize, batch_size: usize },

    #[error("Task {instr_id} has an empty path")]
    EmptyPath { instr_id: Id },

    #[error("Task {instr_id} needs an instruction length to sort the batch")]
    MissingInstructionLength { instr_id: Id },

    #[error("Agent {agent}: state is in scan {state_scan} but task {instr_id} is in {task_scan}")]
    ScanMismatch {
        agent: usize,
        instr_id: Id,
        task_scan: Id,
        state_scan: Id,
    },

    #[error("No minibatch drawn yet; call reset first")]
    NoBatch,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}
