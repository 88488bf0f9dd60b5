//! Visual feature lookup for discretized views.
//!
//! [`FeatureSource`] is a closed set of backends keyed by
//! `(scan, viewpoint, view_index)`. Lookups are pure: the same key always
//! yields the same vector.

pub mod error;

mod npy;
mod synthetic;
mod table;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub use error::FeatureError;
pub use npy::ConvFeatureStore;
pub use synthetic::{RandomFeatures, DEFAULT_DIM};
pub use table::FeatureTable;

use crate::sim::{CameraConfig, SimState};

/// A feature tensor. Table-backed vectors share storage with the table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    shape: Vec<usize>,
    data: Arc<[f32]>,
}

impl FeatureVector {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self::from_shared(shape, data.into())
    }

    pub(crate) fn from_shared(shape: Vec<usize>, data: Arc<[f32]>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data }
    }

    pub fn zeros(len: usize) -> Self {
        Self::new(vec![len], vec![0.0; len])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Where observation features come from.
#[derive(Debug, Clone)]
pub enum FeatureSource {
    /// Per-view mean-pooled vectors from a TSV table.
    MeanPooled(FeatureTable),
    /// Per-view convolutional maps read from `.npy` files.
    Convolutional(ConvFeatureStore),
    /// The same vector for every view.
    Placeholder(FeatureVector),
    /// Deterministic random vectors per scan and viewpoint id.
    SyntheticRandom(RandomFeatures),
}

impl FeatureSource {
    /// Zero vector of the default width for every view.
    pub fn placeholder() -> Self {
        FeatureSource::Placeholder(FeatureVector::zeros(DEFAULT_DIM))
    }

    pub fn from_config(config: &FeatureConfig) -> Result<Self, FeatureError> {
        match config.kind {
            FeatureKind::MeanPooled => {
                let path = config.mean_pooled_store.as_ref().ok_or(FeatureError::MissingStore {
                    kind: "mean_pooled",
                    store: "mean-pooled feature",
                })?;
                FeatureTable::open(path).map(FeatureSource::MeanPooled)
            }
            FeatureKind::Random => {
                let path = config.mean_pooled_store.as_ref().ok_or(FeatureError::MissingStore {
                    kind: "random",
                    store: "mean-pooled feature",
                })?;
                RandomFeatures::open(path, DEFAULT_DIM).map(FeatureSource::SyntheticRandom)
            }
            FeatureKind::Attention => {
                let dir = config
                    .convolutional_store
                    .as_ref()
                    .ok_or(FeatureError::MissingStore {
                        kind: "attention",
                        store: "convolutional feature",
                    })?;
                Ok(FeatureSource::Convolutional(ConvFeatureStore::new(dir)))
            }
            FeatureKind::None => {
                log::info!("Image features not provided");
                Ok(Self::placeholder())
            }
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureSource::MeanPooled(_) => FeatureKind::MeanPooled,
            FeatureSource::Convolutional(_) => FeatureKind::Attention,
            FeatureSource::Placeholder(_) => FeatureKind::None,
            FeatureSource::SyntheticRandom(_) => FeatureKind::Random,
        }
    }

    /// Camera the features were rendered with.
    pub fn camera(&self) -> CameraConfig {
        match self {
            FeatureSource::MeanPooled(table) => table.camera(),
            FeatureSource::SyntheticRandom(random) => random.camera(),
            FeatureSource::Convolutional(_) | FeatureSource::Placeholder(_) => {
                CameraConfig::default()
            }
        }
    }

    pub fn features(
        &self,
        scan: &str,
        viewpoint: &str,
        view_index: usize,
    ) -> Result<FeatureVector, FeatureError> {
        match self {
            FeatureSource::MeanPooled(table) => table.features(scan, viewpoint, view_index),
            FeatureSource::Convolutional(store) => store.features(scan, viewpoint, view_index),
            FeatureSource::Placeholder(vector) => Ok(vector.clone()),
            FeatureSource::SyntheticRandom(random) => random.features(scan, viewpoint, view_index),
        }
    }

    /// Features of the state's current view.
    pub fn for_state(&self, state: &SimState) -> Result<FeatureVector, FeatureError> {
        self.features(&state.scan_id, state.viewpoint_id(), state.view_index)
    }
}

/// Conventional names of the feature backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureKind {
    #[default]
    MeanPooled,
    Attention,
    None,
    Random,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::MeanPooled => "mean_pooled",
            FeatureKind::Attention => "attention",
            FeatureKind::None => "none",
            FeatureKind::Random => "random",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKind {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean_pooled" => Ok(FeatureKind::MeanPooled),
            "attention" => Ok(FeatureKind::Attention),
            "none" => Ok(FeatureKind::None),
            "random" => Ok(FeatureKind::Random),
            other => Err(FeatureError::UnknownKind(other.to_string())),
        }
    }
}

/// Selects and locates a feature backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureConfig {
    pub kind: FeatureKind,
    /// TSV table, used by `mean_pooled` and `random`.
    pub mean_pooled_store: Option<PathBuf>,
    /// Directory of `.npy` arrays, used by `attention`.
    pub convolutional_store: Option<PathBuf>,
}
