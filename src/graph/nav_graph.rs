use super::error::GraphError;
use super::types::Point3;
use crate::Id;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::fmt::Display;

/// A panorama capture location.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewpoint {
    pub id: Id,
    pub position: Point3,
}

/// Undirected viewpoint graph for one scan.
///
/// # Invariants
///
/// - Viewpoint ids are unique within the scan
/// - Edge weights are the Euclidean distance between endpoint positions
/// - At most one edge joins any pair of viewpoints
///
/// Connectivity is taken as delivered by the data source and is not
/// re-validated here.
#[derive(Debug, Clone)]
pub struct NavGraph {
    scan: Id,
    graph: UnGraph<Viewpoint, f64>,
    /// Maps viewpoint id → node index for reverse lookup.
    node_by_id: HashMap<Id, NodeIndex>,
}

impl NavGraph {
    pub fn new(scan: impl Into<Id>) -> Self {
        Self {
            scan: scan.into(),
            graph: UnGraph::default(),
            node_by_id: HashMap::new(),
        }
    }

    pub fn scan(&self) -> &str {
        &self.scan
    }

    /// Adds a viewpoint at `position`.
    ///
    /// # Errors
    ///
    /// `DuplicateViewpoint` if the id is already present.
    pub fn add_viewpoint(
        &mut self,
        id: impl Into<Id>,
        position: Point3,
    ) -> Result<NodeIndex, GraphError> {
        let id = id.into();
        if self.node_by_id.contains_key(&id) {
            return Err(GraphError::DuplicateViewpoint {
                scan: self.scan.clone(),
                viewpoint: id,
            });
        }
        let node = self.graph.add_node(Viewpoint {
            id: id.clone(),
            position,
        });
        self.node_by_id.insert(id, node);
        Ok(node)
    }

    /// Connects two viewpoints, weighting the edge by their distance.
    ///
    /// Connecting an already connected pair is a no-op.
    pub fn connect(&mut self, a: &str, b: &str) -> Result<(), GraphError> {
        let na = self.require(a)?;
        let nb = self.require(b)?;
        let weight = self.graph[na].position.distance_to(&self.graph[nb].position);
        self.graph.update_edge(na, nb, weight);
        Ok(())
    }

    /// Returns the node index for a viewpoint id, if it exists.
    pub fn node_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_by_id.get(id).copied()
    }

    /// Like [`node_of`](Self::node_of) but reports an unknown viewpoint.
    pub fn require(&self, id: &str) -> Result<NodeIndex, GraphError> {
        self.node_of(id).ok_or_else(|| GraphError::UnknownViewpoint {
            scan: self.scan.clone(),
            viewpoint: id.to_string(),
        })
    }

    pub fn viewpoint(&self, id: &str) -> Option<&Viewpoint> {
        self.node_of(id).map(|n| &self.graph[n])
    }

    /// Position of a viewpoint.
    pub fn position(&self, id: &str) -> Result<Point3, GraphError> {
        self.require(id).map(|n| self.graph[n].position)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_by_id.contains_key(id)
    }

    /// Adjacent viewpoints of `id`.
    pub fn neighbors(&self, id: &str) -> Result<Vec<&Viewpoint>, GraphError> {
        let node = self.require(id)?;
        Ok(self.graph.neighbors(node).map(|n| &self.graph[n]).collect())
    }

    /// Returns an iterator over all viewpoints.
    pub fn viewpoints(&self) -> impl Iterator<Item = &Viewpoint> {
        self.graph.node_weights()
    }

    /// Returns an iterator over `(from, to, length)` for every edge.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.graph.edge_references().map(move |e| {
            (
                self.graph[e.source()].id.as_str(),
                self.graph[e.target()].id.as_str(),
                *e.weight(),
            )
        })
    }

    pub fn viewpoint_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns reference to the underlying graph.
    pub fn graph(&self) -> &UnGraph<Viewpoint, f64> {
        &self.graph
    }
}

impl Display for NavGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "NavGraph {} {{", self.scan)?;
        writeln!(f, "  Viewpoints: {}", self.graph.node_count())?;
        writeln!(f, "  Edges: {}", self.graph.edge_count())?;
        write!(f, "}}")
    }
}
