//! Navigation graphs: per-scan viewpoint connectivity and shortest paths.

pub mod error;
pub mod types;

mod nav_graph;
mod paths;
mod store;

#[cfg(feature = "serde")]
mod connectivity;

pub use error::GraphError;
pub use nav_graph::{NavGraph, Viewpoint};
pub use paths::ShortestPaths;
pub use store::{ConnectivitySource, InMemoryConnectivity, NavGraphStore, ScanGraph};
pub use types::Point3;

#[cfg(feature = "serde")]
pub use connectivity::JsonConnectivity;
