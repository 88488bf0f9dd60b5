//! All-pairs shortest paths over a [`NavGraph`].
//!
//! A single-source search is run once from every viewpoint at load time.
//! Each run keeps its distance table and predecessor tree, from which full
//! paths are rebuilt on request. Tables are read-only after construction.

use petgraph::algo::bellman_ford::{bellman_ford, Paths};
use petgraph::graph::NodeIndex;

use super::error::GraphError;
use super::nav_graph::NavGraph;
use crate::Id;

/// Single-source result: distances and predecessors indexed by node.
type SourceTree = Paths<NodeIndex, f64>;

/// Precomputed shortest paths and distances between every viewpoint pair
/// of one scan.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    scan: Id,
    trees: Vec<SourceTree>,
}

impl ShortestPaths {
    /// Solves single-source shortest paths from every viewpoint of `graph`.
    ///
    /// # Errors
    ///
    /// `NegativeEdge` if an edge carries a negative weight.
    pub fn compute(graph: &NavGraph) -> Result<Self, GraphError> {
        let trees = graph
            .graph()
            .node_indices()
            .map(|source| {
                bellman_ford(graph.graph(), source).map_err(|_| GraphError::NegativeEdge {
                    scan: graph.scan().to_string(),
                })
            })
            .collect::<Result<Vec<SourceTree>, _>>()?;
        Ok(Self {
            scan: graph.scan().to_string(),
            trees,
        })
    }

    /// Full path from `src` to `dst`, both ends included.
    ///
    /// # Errors
    ///
    /// - `UnknownViewpoint` if either id is not in the graph
    /// - `Unreachable` if the two lie in disconnected components
    pub fn path(&self, graph: &NavGraph, src: &str, dst: &str) -> Result<Vec<Id>, GraphError> {
        let nodes = self.node_path(graph, src, dst)?;
        Ok(nodes
            .into_iter()
            .map(|n| graph.graph()[n].id.clone())
            .collect())
    }

    /// The viewpoint following `src` on the shortest path to `dst`.
    ///
    /// Returns `None` when `src == dst`.
    pub fn next_hop<'g>(
        &self,
        graph: &'g NavGraph,
        src: &str,
        dst: &str,
    ) -> Result<Option<&'g str>, GraphError> {
        let nodes = self.node_path(graph, src, dst)?;
        Ok(nodes.get(1).map(|&n| graph.graph()[n].id.as_str()))
    }

    /// Length of the shortest path from `src` to `dst`.
    pub fn distance(&self, graph: &NavGraph, src: &str, dst: &str) -> Result<f64, GraphError> {
        let s = graph.require(src)?;
        let d = graph.require(dst)?;
        let distance = self.trees[s.index()].distances[d.index()];
        if distance.is_finite() {
            Ok(distance)
        } else {
            Err(self.unreachable(src, dst))
        }
    }

    fn node_path(&self, graph: &NavGraph, src: &str, dst: &str) -> Result<Vec<NodeIndex>, GraphError> {
        let s = graph.require(src)?;
        let d = graph.require(dst)?;
        let tree = &self.trees[s.index()];
        if !tree.distances[d.index()].is_finite() {
            return Err(self.unreachable(src, dst));
        }

        let mut path = vec![d];
        let mut current = d;
        while current != s {
            match tree.predecessors[current.index()] {
                Some(prev) => {
                    path.push(prev);
                    current = prev;
                }
                None => return Err(self.unreachable(src, dst)),
            }
        }
        path.reverse();
        Ok(path)
    }

    fn unreachable(&self, src: &str, dst: &str) -> GraphError {
        GraphError::Unreachable {
            scan: self.scan.clone(),
            from: src.to_string(),
            to: dst.to_string(),
        }
    }
}
