use std::path::PathBuf;

use thiserror::Error;

use crate::Id;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeatureError {
    #[error("No features for viewpoint {viewpoint} in scan {scan}")]
    Missing { scan: Id, viewpoint: Id },

    #[error("View index {view_index} out of range ({views} views)")]
    ViewOutOfRange { view_index: usize, views: usize },

    #[error("Failed to read feature store {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Malformed feature row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("Malformed array file {path}: {reason}")]
    MalformedArray { path: PathBuf, reason: String },

    #[error("Feature source {kind} needs a {store} path")]
    MissingStore { kind: &'static str, store: &'static str },

    #[error("Unknown feature type {0}; expected mean_pooled, attention, none or random")]
    UnknownKind(String),
}

impl FeatureError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        FeatureError::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
