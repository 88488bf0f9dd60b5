//! Per-scan graph registry with precomputed shortest paths.

use std::collections::{BTreeMap, HashMap};

use super::error::GraphError;
use super::nav_graph::NavGraph;
use super::paths::ShortestPaths;
use crate::Id;

/// Supplier of per-scan connectivity.
///
/// The on-disk connectivity format belongs to the implementor; the store
/// only needs a built [`NavGraph`] per scan id.
pub trait ConnectivitySource {
    /// Builds the graph for one scan.
    ///
    /// # Errors
    ///
    /// `MissingConnectivity` when the source has nothing for `scan`.
    fn load_scan(&self, scan: &str) -> Result<NavGraph, GraphError>;
}

/// Connectivity held in memory, for programmatic or synthetic scans.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnectivity {
    graphs: HashMap<Id, NavGraph>,
}

impl InMemoryConnectivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a graph under its own scan id, replacing any previous one.
    pub fn insert(&mut self, graph: NavGraph) {
        self.graphs.insert(graph.scan().to_string(), graph);
    }

    pub fn with(mut self, graph: NavGraph) -> Self {
        self.insert(graph);
        self
    }
}

impl ConnectivitySource for InMemoryConnectivity {
    fn load_scan(&self, scan: &str) -> Result<NavGraph, GraphError> {
        self.graphs
            .get(scan)
            .cloned()
            .ok_or_else(|| GraphError::MissingConnectivity(scan.to_string()))
    }
}

/// Graph and shortest-path tables for one scan.
#[derive(Debug, Clone)]
pub struct ScanGraph {
    graph: NavGraph,
    paths: ShortestPaths,
}

impl ScanGraph {
    pub fn new(graph: NavGraph) -> Result<Self, GraphError> {
        let paths = ShortestPaths::compute(&graph)?;
        Ok(Self { graph, paths })
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn paths(&self) -> &ShortestPaths {
        &self.paths
    }

    pub fn path(&self, src: &str, dst: &str) -> Result<Vec<Id>, GraphError> {
        self.paths.path(&self.graph, src, dst)
    }

    pub fn next_hop(&self, src: &str, dst: &str) -> Result<Option<&str>, GraphError> {
        self.paths.next_hop(&self.graph, src, dst)
    }

    pub fn distance(&self, src: &str, dst: &str) -> Result<f64, GraphError> {
        self.paths.distance(&self.graph, src, dst)
    }
}

/// Navigation graphs for a set of scans.
///
/// Built once; read-only afterwards and safe to share behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct NavGraphStore {
    scans: BTreeMap<Id, ScanGraph>,
}

impl NavGraphStore {
    /// Loads every scan in `scan_ids` from `source` and precomputes paths.
    ///
    /// # Errors
    ///
    /// Propagates the first source failure, typically `MissingConnectivity`.
    pub fn load<S, I, T>(source: &S, scan_ids: I) -> Result<Self, GraphError>
    where
        S: ConnectivitySource + ?Sized,
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let scan_ids: Vec<T> = scan_ids.into_iter().collect();
        log::info!("Loading navigation graphs for {} scans", scan_ids.len());

        let mut store = Self::default();
        for scan in &scan_ids {
            let graph = source.load_scan(scan.as_ref())?;
            store.insert(graph)?;
        }
        Ok(store)
    }

    /// Adds (or replaces) a scan, computing its path tables.
    pub fn insert(&mut self, graph: NavGraph) -> Result<(), GraphError> {
        log::debug!(
            "computing shortest paths for scan {} ({} viewpoints)",
            graph.scan(),
            graph.viewpoint_count()
        );
        let scan = graph.scan().to_string();
        self.scans.insert(scan, ScanGraph::new(graph)?);
        Ok(())
    }

    pub fn scan(&self, scan: &str) -> Result<&ScanGraph, GraphError> {
        self.scans
            .get(scan)
            .ok_or_else(|| GraphError::UnknownScan(scan.to_string()))
    }

    pub fn graph(&self, scan: &str) -> Result<&NavGraph, GraphError> {
        self.scan(scan).map(ScanGraph::graph)
    }

    pub fn contains_scan(&self, scan: &str) -> bool {
        self.scans.contains_key(scan)
    }

    pub fn scan_ids(&self) -> impl Iterator<Item = &str> {
        self.scans.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    /// Precomputed shortest path from `src` to `dst` within `scan`.
    pub fn path_between(&self, scan: &str, src: &str, dst: &str) -> Result<Vec<Id>, GraphError> {
        self.scan(scan)?.path(src, dst)
    }

    pub fn next_hop(&self, scan: &str, src: &str, dst: &str) -> Result<Option<&str>, GraphError> {
        self.scan(scan)?.next_hop(src, dst)
    }

    pub fn distance(&self, scan: &str, src: &str, dst: &str) -> Result<f64, GraphError> {
        self.scan(scan)?.distance(src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::Point3;

    fn source() -> InMemoryConnectivity {
        let mut g = NavGraph::new("house");
        g.add_viewpoint("x", Point3::new(0.0, 0.0, 1.5)).unwrap();
        g.add_viewpoint("y", Point3::new(0.0, 2.0, 1.5)).unwrap();
        g.connect("x", "y").unwrap();
        InMemoryConnectivity::new().with(g)
    }

    #[test]
    fn load_builds_requested_scans() {
        let store = NavGraphStore::load(&source(), ["house"]).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.path_between("house", "x", "y").unwrap(), vec!["x", "y"]);
        assert!((store.distance("house", "y", "x").unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn missing_scan_fails_load() {
        let err = NavGraphStore::load(&source(), ["house", "garage"]).unwrap_err();
        assert_eq!(err, GraphError::MissingConnectivity("garage".into()));
    }

    #[test]
    fn unknown_scan_lookup() {
        let store = NavGraphStore::load(&source(), ["house"]).unwrap();
        assert_eq!(
            store.path_between("garage", "x", "y"),
            Err(GraphError::UnknownScan("garage".into()))
        );
    }
}
