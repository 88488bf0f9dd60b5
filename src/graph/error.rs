use thiserror::Error;

use crate::Id;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("No connectivity data for scan {0}")]
    MissingConnectivity(Id),

    #[error("Failed to read connectivity for scan {scan}: {reason}")]
    Malformed { scan: Id, reason: String },

    #[error("Scan {scan}: edge {from} -> {to} is not mirrored, graph should be undirected")]
    AsymmetricEdge { scan: Id, from: Id, to: Id },

    #[error("Scan {0} is not loaded")]
    UnknownScan(Id),

    #[error("Scan {scan} has no viewpoint {viewpoint}")]
    UnknownViewpoint { scan: Id, viewpoint: Id },

    #[error("Viewpoint {viewpoint} already exists in scan {scan}")]
    DuplicateViewpoint { scan: Id, viewpoint: Id },

    #[error("Scan {scan}: no path from {from} to {to}")]
    Unreachable { scan: Id, from: Id, to: Id },

    #[error("Scan {scan} has a negative edge weight")]
    NegativeEdge { scan: Id },
}
