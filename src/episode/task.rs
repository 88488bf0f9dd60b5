//! Navigation tasks: one instruction over one reference path.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Id;

/// Turns instruction text into token ids.
///
/// Tokenization semantics belong to the implementor; the environment only
/// forwards the encoding and its length into observations.
pub trait Tokenizer {
    /// Returns the token ids and the unpadded length.
    fn encode_sentence(&self, sentence: &str) -> (Vec<usize>, usize);
}

/// Identifier of a reference path in a dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PathId {
    Int(u64),
    Text(String),
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathId::Int(n) => write!(f, "{n}"),
            PathId::Text(s) => f.write_str(s),
        }
    }
}

/// One dataset record: a reference path annotated with several instructions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathRecord {
    pub scan: Id,
    pub path: Vec<Id>,
    pub heading: f64,
    pub instructions: Vec<String>,
    pub path_id: PathId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub distance: Option<f64>,
}

/// A single navigation task.
///
/// Immutable once minted and shared between minibatches by `Arc`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentTask {
    /// `{path_id}_{instruction_index}`.
    pub instr_id: String,
    pub scan: Id,
    /// Reference path, start first and goal last.
    pub path: Vec<Id>,
    /// Start heading in radians.
    pub heading: f64,
    pub instructions: String,
    pub path_id: PathId,
    pub instr_encoding: Option<Vec<usize>>,
    pub instr_length: Option<usize>,
}

impl AgentTask {
    pub fn start(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    pub fn goal(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

/// Splits each record into one task per instruction.
pub fn mint_tasks<'a, I>(records: I, tokenizer: Option<&dyn Tokenizer>) -> Vec<Arc<AgentTask>>
where
    I: IntoIterator<Item = &'a PathRecord>,
{
    records
        .into_iter()
        .flat_map(|record| {
            record
                .instructions
                .iter()
                .enumerate()
                .map(move |(j, instr)| (record, j, instr))
        })
        .map(|(record, j, instr)| {
            let (instr_encoding, instr_length) = match tokenizer {
                Some(t) => {
                    let (encoding, length) = t.encode_sentence(instr);
                    (Some(encoding), Some(length))
                }
                None => (None, None),
            };
            Arc::new(AgentTask {
                instr_id: format!("{}_{}", record.path_id, j),
                scan: record.scan.clone(),
                path: record.path.clone(),
                heading: record.heading,
                instructions: instr.clone(),
                path_id: record.path_id.clone(),
                instr_encoding,
                instr_length,
            })
        })
        .collect()
}
