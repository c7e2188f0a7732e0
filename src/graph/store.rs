//! Shared graph state with atomic snapshot replacement.
//!
//! Snapshots fully replace the topology: a fresh [`Topology`] is built off
//! to the side and swapped in with a single atomic store, so concurrent
//! readers hold either the previous or the next graph, never a mixture.
//! Long-running algorithms pin the [`Arc`] view they started with and are
//! unaffected by later swaps.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::Result;
use crate::graph::adjacency::AdjacencyMatrix;
use crate::graph::stats::{self, Centrality, GraphStats};
use crate::graph::topology::Topology;
use crate::protocol::GraphSnapshot;

/// Counts reported after a successful snapshot application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub nodes: usize,
    pub links: usize,
}

/// Concurrent owner of the current [`Topology`].
#[derive(Debug, Default)]
pub struct GraphStore {
    current: ArcSwap<Topology>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the graph with the snapshot's contents. A
    /// malformed timestamp rejects the snapshot without touching state.
    pub fn apply_snapshot(&self, snapshot: &GraphSnapshot) -> Result<SnapshotSummary> {
        let topology = Topology::from_snapshot(snapshot)?;
        let summary = SnapshotSummary {
            nodes: topology.node_count(),
            links: topology.edge_count(),
        };
        self.current.store(Arc::new(topology));
        info!(
            component = "graph_store",
            nodes = summary.nodes,
            links = summary.links,
            "snapshot applied"
        );
        Ok(summary)
    }

    /// Consistent read view for algorithms; immune to later swaps.
    pub fn view(&self) -> Arc<Topology> {
        self.current.load_full()
    }

    pub fn neighbors(&self, id: &str) -> Vec<String> {
        self.view().neighbors(id).to_vec()
    }

    pub fn edge_weight(&self, u: &str, v: &str) -> f64 {
        self.view().edge_weight(u, v)
    }

    pub fn is_connected(&self, u: &str, v: &str) -> bool {
        self.view().is_connected(u, v)
    }

    pub fn node_count(&self) -> usize {
        self.view().node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.view().edge_count()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.view().timestamp()
    }

    pub fn adjacency_matrix(&self) -> AdjacencyMatrix {
        self.view().matrix().clone()
    }

    pub fn stats(&self) -> GraphStats {
        stats::graph_stats(&self.view())
    }

    pub fn centralities(&self) -> std::collections::HashMap<String, Centrality> {
        stats::centralities(&self.view())
    }

    /// Top-n nodes by blended centrality.
    pub fn critical_nodes(&self, top_n: usize) -> Vec<String> {
        let nodes = stats::critical_nodes(&self.view(), top_n);
        debug!(
            component = "graph_store",
            count = nodes.len(),
            "critical nodes ranked"
        );
        nodes
    }
}
