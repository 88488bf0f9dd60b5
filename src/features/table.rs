//! Mean-pooled feature table loaded from a tab-separated file.
//!
//! Each row is `scan, viewpoint, image_w, image_h, vfov, features` where
//! `features` is a base64 little-endian `f32` array of 36 views × D.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::error::FeatureError;
use super::FeatureVector;
use crate::sim::CameraConfig;
use crate::units::VIEW_COUNT;
use crate::Id;

const FIELD_COUNT: usize = 6;

/// One parsed row, features still encoded.
pub(crate) struct RawRow<'a> {
    pub scan: &'a str,
    pub viewpoint: &'a str,
    pub camera: CameraConfig,
    pub features: &'a str,
}

pub(crate) fn parse_row(line_no: usize, line: &str) -> Result<RawRow<'_>, FeatureError> {
    let malformed = |reason: String| FeatureError::MalformedRow {
        line: line_no,
        reason,
    };
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != FIELD_COUNT {
        return Err(malformed(format!(
            "expected {FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    }
    let width = fields[2]
        .parse::<u32>()
        .map_err(|e| malformed(format!("image_w: {e}")))?;
    let height = fields[3]
        .parse::<u32>()
        .map_err(|e| malformed(format!("image_h: {e}")))?;
    let vfov_degrees = fields[4]
        .parse::<f64>()
        .map_err(|e| malformed(format!("vfov: {e}")))?;

    Ok(RawRow {
        scan: fields[0],
        viewpoint: fields[1],
        camera: CameraConfig {
            width,
            height,
            vfov_degrees,
        },
        features: fields[5],
    })
}

/// Reads rows of `reader`, skipping blank lines, handing each to `f`.
pub(crate) fn for_each_row<R: BufRead>(
    reader: R,
    mut f: impl FnMut(usize, RawRow<'_>) -> Result<(), FeatureError>,
) -> Result<(), FeatureError> {
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| FeatureError::MalformedRow {
            line: line_no,
            reason: e.to_string(),
        })?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        f(line_no, parse_row(line_no, line)?)?;
    }
    Ok(())
}

fn decode_views(line_no: usize, encoded: &str) -> Result<Vec<Arc<[f32]>>, FeatureError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| FeatureError::MalformedRow {
            line: line_no,
            reason: format!("features: {e}"),
        })?;
    let stride = VIEW_COUNT * 4;
    if bytes.is_empty() || bytes.len() % stride != 0 {
        return Err(FeatureError::MalformedRow {
            line: line_no,
            reason: format!("{} feature bytes do not split into {VIEW_COUNT} views", bytes.len()),
        });
    }
    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let dim = values.len() / VIEW_COUNT;
    Ok(values.chunks_exact(dim).map(Arc::from).collect())
}

/// Per-viewpoint 36 × D feature rows plus the camera they were rendered with.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    rows: HashMap<Id, HashMap<Id, Vec<Arc<[f32]>>>>,
    camera: CameraConfig,
    dim: usize,
}

impl FeatureTable {
    /// Loads a table from a TSV file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let path = path.as_ref();
        log::info!("Loading image features from {}", path.display());
        let file = File::open(path).map_err(|e| FeatureError::io(path, &e))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, FeatureError> {
        let mut table = Self::default();
        for_each_row(reader, |line_no, row| {
            let views = decode_views(line_no, row.features)?;
            let dim = views[0].len();
            if table.dim != 0 && table.dim != dim {
                return Err(FeatureError::MalformedRow {
                    line: line_no,
                    reason: format!("feature width {dim} differs from {}", table.dim),
                });
            }
            table.dim = dim;
            table.camera = row.camera;
            table
                .rows
                .entry(row.scan.to_string())
                .or_default()
                .insert(row.viewpoint.to_string(), views);
            Ok(())
        })?;
        Ok(table)
    }

    /// Camera of the last row read; the default camera for an empty table.
    pub fn camera(&self) -> CameraConfig {
        self.camera
    }

    /// Feature width D.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of viewpoints with features.
    pub fn len(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, scan: &str, viewpoint: &str) -> bool {
        self.rows
            .get(scan)
            .is_some_and(|vps| vps.contains_key(viewpoint))
    }

    pub fn features(
        &self,
        scan: &str,
        viewpoint: &str,
        view_index: usize,
    ) -> Result<FeatureVector, FeatureError> {
        let views = self
            .rows
            .get(scan)
            .and_then(|vps| vps.get(viewpoint))
            .ok_or_else(|| FeatureError::Missing {
                scan: scan.to_string(),
                viewpoint: viewpoint.to_string(),
            })?;
        let row = views.get(view_index).ok_or(FeatureError::ViewOutOfRange {
            view_index,
            views: views.len(),
        })?;
        Ok(FeatureVector::from_shared(vec![row.len()], Arc::clone(row)))
    }
}
