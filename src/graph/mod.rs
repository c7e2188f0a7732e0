//! Network graph state: topology snapshots, the concurrent store, the
//! dense adjacency view and whole-graph statistics.

pub mod adjacency;
pub mod stats;
pub mod store;
pub mod topology;

pub use adjacency::AdjacencyMatrix;
pub use stats::{Centrality, GraphStats};
pub use store::{GraphStore, SnapshotSummary};
pub use topology::{
    EdgeData, NodeData, Topology, DOWN_NODE_PENALTY, MIN_WEIGHT_FLOOR, UNAVAILABLE_LINK_PENALTY,
};
