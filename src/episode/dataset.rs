//! Loader for `R2R_<split>.json` task files.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::task::PathRecord;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to parse dataset {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// File name of a split inside the dataset directory.
pub fn split_file(dir: &Path, split: &str) -> PathBuf {
    dir.join(format!("R2R_{split}.json"))
}

/// Reads every record of one split.
pub fn load_split(dir: impl AsRef<Path>, split: &str) -> Result<Vec<PathRecord>, DatasetError> {
    let path = split_file(dir.as_ref(), split);
    let text = fs::read_to_string(&path).map_err(|e| DatasetError::Io {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| DatasetError::Parse {
        path,
        reason: e.to_string(),
    })
}

/// Concatenates the records of `splits` in order.
pub fn load_datasets<S: AsRef<str>>(
    dir: impl AsRef<Path>,
    splits: &[S],
) -> Result<Vec<PathRecord>, DatasetError> {
    let dir = dir.as_ref();
    let mut records = Vec::new();
    for split in splits {
        let mut part = load_split(dir, split.as_ref())?;
        log::debug!("split {} holds {} paths", split.as_ref(), part.len());
        records.append(&mut part);
    }
    log::info!(
        "Loaded {} paths from {} splits in {}",
        records.len(),
        splits.len(),
        dir.display()
    );
    Ok(records)
}
