mod error;
mod graph;
mod load;
mod sample;

pub use error::GraphError;
pub use graph::{GraphEdge, GraphNode, GraphSnapshot, NodeKind};
pub use load::load_graph_snapshot;
pub use sample::sample_graph;
