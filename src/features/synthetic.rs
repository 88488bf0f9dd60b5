//! Deterministic random features for ablations without real images.
//!
//! Every scan id and every viewpoint id owns a 36 × D/2 block of
//! `max(0, 0.5·N(0,1) + 0.3)` values seeded from a stable hash of the id.
//! A view's feature is the scan row followed by the viewpoint row.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use super::error::FeatureError;
use super::table::for_each_row;
use super::FeatureVector;
use crate::sim::CameraConfig;
use crate::units::VIEW_COUNT;
use crate::Id;

/// Default feature width, matching mean-pooled ResNet features.
pub const DEFAULT_DIM: usize = 2048;

fn seed_for(id: &str) -> u64 {
    let (hi, lo) = Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()).as_u64_pair();
    hi ^ lo
}

/// Gaussian sample via Box-Muller.
fn box_muller(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-300);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Row `view_index` of the id's block.
fn id_row(id: &str, view_index: usize, width: usize) -> impl Iterator<Item = f32> {
    let mut rng = StdRng::seed_from_u64(seed_for(id));
    (0..view_index * width).for_each(|_| {
        box_muller(&mut rng);
    });
    (0..width).map(move |_| (0.5 * box_muller(&mut rng) + 0.3).max(0.0) as f32)
}

/// Random features over a fixed key set.
#[derive(Debug, Clone)]
pub struct RandomFeatures {
    keys: HashMap<Id, HashSet<Id>>,
    dim: usize,
    camera: CameraConfig,
}

impl RandomFeatures {
    pub fn new<I, S, V>(keys: I, dim: usize) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<Id>,
        V: Into<Id>,
    {
        let mut by_scan: HashMap<Id, HashSet<Id>> = HashMap::new();
        for (scan, viewpoint) in keys {
            by_scan.entry(scan.into()).or_default().insert(viewpoint.into());
        }
        Self {
            keys: by_scan,
            dim,
            camera: CameraConfig::default(),
        }
    }

    /// Takes the key set and camera from a mean-pooled TSV, ignoring its
    /// feature column.
    pub fn from_table_keys<R: BufRead>(reader: R, dim: usize) -> Result<Self, FeatureError> {
        let mut keys = Vec::new();
        let mut camera = CameraConfig::default();
        for_each_row(reader, |_, row| {
            keys.push((row.scan.to_string(), row.viewpoint.to_string()));
            camera = row.camera;
            Ok(())
        })?;
        Ok(Self::new(keys, dim).with_camera(camera))
    }

    pub fn open(path: impl AsRef<Path>, dim: usize) -> Result<Self, FeatureError> {
        let path = path.as_ref();
        log::info!("Loading random feature keys from {}", path.display());
        let file = std::fs::File::open(path).map_err(|e| FeatureError::io(path, &e))?;
        Self::from_table_keys(std::io::BufReader::new(file), dim)
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn camera(&self) -> CameraConfig {
        self.camera
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn features(
        &self,
        scan: &str,
        viewpoint: &str,
        view_index: usize,
    ) -> Result<FeatureVector, FeatureError> {
        if !self
            .keys
            .get(scan)
            .is_some_and(|vps| vps.contains(viewpoint))
        {
            return Err(FeatureError::Missing {
                scan: scan.to_string(),
                viewpoint: viewpoint.to_string(),
            });
        }
        if view_index >= VIEW_COUNT {
            return Err(FeatureError::ViewOutOfRange {
                view_index,
                views: VIEW_COUNT,
            });
        }
        let half = self.dim / 2;
        let values: Vec<f32> = id_row(scan, view_index, half)
            .chain(id_row(viewpoint, view_index, half))
            .collect();
        Ok(FeatureVector::new(vec![values.len()], values))
    }
}
