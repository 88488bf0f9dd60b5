//! r2r-nav - Batched vision-and-language navigation environment
//!
//! Agents follow natural-language instructions across the viewpoint graphs
//! of indoor scans. The crate loads per-scan navigation graphs with
//! all-pairs shortest paths, drives a batch of discretized panoramic
//! simulators (optionally with several beam slots per agent), draws seeded
//! minibatches of instruction tasks, attaches image features to each view
//! and labels every observation with the shortest-path teacher action.

pub mod episode;
pub mod features;
pub mod graph;
pub mod metrics;
pub mod oracle;
pub mod policy;
pub mod sim;
pub mod units;

// Re-export unit conversion traits for ergonomic use
pub use units::{convert, SameDim};

pub use episode::{EnvConfig, EpisodeError, NavBatch, Observation};
pub use features::{FeatureSource, FeatureVector};
pub use graph::{NavGraphStore, Point3};
pub use oracle::ShortestPathOracle;
pub use sim::{Batch, Nesting, PrimitiveAction, SimState};

/// Identifier type used for scans and viewpoints.
pub type Id = String;
