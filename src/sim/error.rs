use thiserror::Error;

use crate::graph::GraphError;
use crate::Id;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid simple action {0}; expected 0..=4")]
    InvalidSimpleAction(usize),

    #[error("Batch shape mismatch: expected {expected} agents, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Cannot combine flat and beamed batches")]
    NestingMismatch,

    #[error("Agent {agent}: beam of {len} exceeds beam width {beam_size}")]
    BeamOverflow {
        agent: usize,
        len: usize,
        beam_size: usize,
    },

    #[error("Navigable index {index} out of range ({available} locations at {viewpoint})")]
    NavigableIndexOutOfRange {
        index: usize,
        available: usize,
        viewpoint: Id,
    },

    #[error("Simulator has no episode loaded")]
    NoEpisode,

    #[error("Simulator configuration rejected: {0}")]
    Config(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
