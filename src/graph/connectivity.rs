//! Reader for `<scan>_connectivity.json` files.
//!
//! Each file is a JSON array with one entry per panorama:
//!
//! ```text
//! { "image_id": "...", "pose": [16 floats, row-major 4x4],
//!   "included": true, "unobstructed": [bool; N], ... }
//! ```
//!
//! The position is the translation column of the pose matrix. Two
//! viewpoints are joined when both are included and each lists the other
//! as unobstructed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::GraphError;
use super::nav_graph::NavGraph;
use super::store::ConnectivitySource;
use super::types::Point3;

#[derive(Debug, Clone, Deserialize)]
struct PanoramaEntry {
    image_id: String,
    pose: Vec<f64>,
    included: bool,
    unobstructed: Vec<bool>,
}

impl PanoramaEntry {
    fn position(&self) -> Option<Point3> {
        if self.pose.len() < 12 {
            return None;
        }
        Some(Point3::new(self.pose[3], self.pose[7], self.pose[11]))
    }
}

/// Connectivity read from a directory of per-scan JSON files.
#[derive(Debug, Clone)]
pub struct JsonConnectivity {
    dir: PathBuf,
}

impl JsonConnectivity {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, scan: &str) -> PathBuf {
        self.dir.join(format!("{scan}_connectivity.json"))
    }

    /// Builds a graph from the raw JSON text of one connectivity file.
    pub fn parse(scan: &str, json: &str) -> Result<NavGraph, GraphError> {
        let malformed = |reason: String| GraphError::Malformed {
            scan: scan.to_string(),
            reason,
        };
        let entries: Vec<PanoramaEntry> =
            serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;

        let mut graph = NavGraph::new(scan);
        for entry in entries.iter().filter(|e| e.included) {
            let position = entry
                .position()
                .ok_or_else(|| malformed(format!("pose of {} is truncated", entry.image_id)))?;
            graph.add_viewpoint(entry.image_id.clone(), position)?;
        }

        for (i, entry) in entries.iter().enumerate() {
            if !entry.included {
                continue;
            }
            for (j, &open) in entry.unobstructed.iter().enumerate() {
                if !open {
                    continue;
                }
                let other = entries.get(j).ok_or_else(|| {
                    malformed(format!(
                        "{} lists unobstructed index {j} out of range",
                        entry.image_id
                    ))
                })?;
                if !other.included {
                    continue;
                }
                if !other.unobstructed.get(i).copied().unwrap_or(false) {
                    return Err(GraphError::AsymmetricEdge {
                        scan: scan.to_string(),
                        from: entry.image_id.clone(),
                        to: other.image_id.clone(),
                    });
                }
                graph.connect(&entry.image_id, &other.image_id)?;
            }
        }

        Ok(graph)
    }
}

impl ConnectivitySource for JsonConnectivity {
    fn load_scan(&self, scan: &str) -> Result<NavGraph, GraphError> {
        let path = self.file_for(scan);
        let json = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => GraphError::MissingConnectivity(scan.to_string()),
            _ => GraphError::Malformed {
                scan: scan.to_string(),
                reason: format!("{}: {e}", path.display()),
            },
        })?;
        Self::parse(scan, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pose(x: f64, y: f64, z: f64) -> Vec<f64> {
        vec![
            1.0, 0.0, 0.0, x, //
            0.0, 1.0, 0.0, y, //
            0.0, 0.0, 1.0, z, //
            0.0, 0.0, 0.0, 1.0,
        ]
    }

    fn sample() -> serde_json::Value {
        json!([
            {"image_id": "p0", "pose": pose(0.0, 0.0, 1.5), "included": true,
             "unobstructed": [false, true, true], "height": 1.5},
            {"image_id": "p1", "pose": pose(0.0, 3.0, 1.5), "included": true,
             "unobstructed": [true, false, false], "height": 1.5},
            {"image_id": "p2", "pose": pose(4.0, 0.0, 1.5), "included": false,
             "unobstructed": [true, false, false], "height": 1.5}
        ])
    }

    #[test]
    fn parse_skips_excluded_panoramas() {
        let g = JsonConnectivity::parse("s", &sample().to_string()).unwrap();
        assert_eq!(g.viewpoint_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.position("p1").unwrap(), Point3::new(0.0, 3.0, 1.5));
        assert!(!g.contains("p2"));
    }

    #[test]
    fn asymmetric_edge_is_rejected() {
        let mut data = sample();
        data[1]["unobstructed"] = json!([false, false, false]);
        let err = JsonConnectivity::parse("s", &data.to_string()).unwrap_err();
        assert!(matches!(err, GraphError::AsymmetricEdge { .. }));
    }

    #[test]
    fn load_scan_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("s_connectivity.json"), sample().to_string()).unwrap();
        let source = JsonConnectivity::new(dir.path());
        let g = source.load_scan("s").unwrap();
        assert_eq!(g.scan(), "s");
        assert_eq!(
            source.load_scan("other").unwrap_err(),
            GraphError::MissingConnectivity("other".into())
        );
    }
}
