use std::fmt;

use thiserror::Error;

/// Which end of an edge a node reference belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Reasons a graph snapshot is rejected before it reaches the simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An edge names a node id that is not part of the snapshot.
    #[error("edge {edge_id} has a dangling {endpoint} reference to unknown node {node_id}")]
    DanglingEdge {
        edge_id: String,
        endpoint: Endpoint,
        node_id: String,
    },

    /// Two nodes share the same id.
    #[error("duplicate node id {0}")]
    DuplicateNode(String),

    /// Edge weight is negative, NaN or infinite.
    #[error("edge {edge_id} has invalid weight {weight}")]
    InvalidWeight { edge_id: String, weight: f32 },
}
