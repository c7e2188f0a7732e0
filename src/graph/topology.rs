//! Immutable network topology built from one snapshot.
//!
//! A [`Topology`] is constructed in full from a [`GraphSnapshot`] and never
//! mutated afterwards; the store swaps whole instances so readers always see
//! a consistent graph. Links are undirected, parallel snapshot entries for
//! the same pair coalesce (last write wins), and unavailable links stay in
//! the graph with a prohibitive weight instead of being dropped.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::graph::adjacency::AdjacencyMatrix;
use crate::protocol::{GraphSnapshot, Link, LinkMetrics, Node, NodeType};

/// No edge may cost less than this; keeps zero-metric links from becoming
/// free shortcuts.
pub const MIN_WEIGHT_FLOOR: f64 = 1e-4;
/// Weight floor for links reported unavailable.
pub const UNAVAILABLE_LINK_PENALTY: f64 = 5e8;
/// Weight floor for links touching a node that is not UP.
pub const DOWN_NODE_PENALTY: f64 = 1e9;
/// Minimum incident weight assumed for nodes with no edges, used by the
/// A* heuristic.
pub const ISOLATED_MIN_WEIGHT: f64 = 100.0;

const STATUS_UP: &str = "UP";

/// Node state as held in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub id: String,
    pub kind: NodeType,
    pub status: String,
    pub cpu_load: f64,
    pub jitter_ms: f64,
    pub queue_len: u32,
    pub throughput_mbps: f64,
    pub last_updated: DateTime<Utc>,
}

impl NodeData {
    pub fn is_up(&self) -> bool {
        self.status == STATUS_UP
    }

    fn from_record(node: &Node, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind,
            status: node.status.clone(),
            cpu_load: node.metrics.cpu_load,
            jitter_ms: node.metrics.jitter_ms,
            queue_len: node.metrics.queue_len,
            throughput_mbps: node.metrics.throughput_mbps,
            last_updated: timestamp,
        }
    }

    /// Placeholder for link endpoints the snapshot never declared.
    fn placeholder(id: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            kind: NodeType::Unknown,
            status: STATUS_UP.to_string(),
            cpu_load: 0.0,
            jitter_ms: 0.0,
            queue_len: 0,
            throughput_mbps: 0.0,
            last_updated: timestamp,
        }
    }
}

/// Edge state as held in the graph. `weight` is the composite penalty the
/// routing algorithms minimize; the raw metrics stay available for route
/// post-processing.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    pub weight: f64,
    pub delay_ms: f64,
    pub jitter_ms: f64,
    pub loss_rate: f64,
    pub bandwidth_mbps: f64,
    pub available: bool,
    pub last_updated: DateTime<Utc>,
}

/// Undirected edge key, normalized so (a, b) and (b, a) collide.
pub(crate) fn edge_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Composite edge weight. Derived on insertion, never taken from client
/// input.
fn compose_weight(metrics: &LinkMetrics, available: bool, src: &NodeData, dst: &NodeData) -> f64 {
    let bandwidth_penalty = 1000.0 / (metrics.bandwidth_mbps + 1.0);
    let node_penalty = src.cpu_load * 5.0
        + f64::from(src.queue_len) * 0.5
        + dst.cpu_load * 5.0
        + f64::from(dst.queue_len) * 0.5;

    let mut weight = metrics.delay_ms
        + metrics.jitter_ms * 2.0
        + metrics.loss_rate * 1000.0
        + bandwidth_penalty * 0.1
        + node_penalty;

    if !available {
        weight = weight.max(UNAVAILABLE_LINK_PENALTY);
    }
    if !src.is_up() || !dst.is_up() {
        weight = weight.max(DOWN_NODE_PENALTY);
    }

    weight.max(MIN_WEIGHT_FLOOR)
}

/// One fully-applied snapshot of the network.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: HashMap<String, NodeData>,
    node_order: Vec<String>,
    adjacency: HashMap<String, Vec<String>>,
    edges: HashMap<(String, String), EdgeData>,
    matrix: AdjacencyMatrix,
    timestamp: Option<DateTime<Utc>>,
}

impl Topology {
    /// Build a topology from a snapshot. Rejects the snapshot if its
    /// timestamp does not parse; nothing else can fail.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self> {
        let timestamp = parse_snapshot_timestamp(&snapshot.timestamp)?;

        let mut topology = Topology {
            timestamp: Some(timestamp),
            ..Topology::default()
        };

        for node in &snapshot.nodes {
            topology.insert_node(NodeData::from_record(node, timestamp));
        }
        for link in &snapshot.links {
            topology.insert_link(link, timestamp);
        }

        topology.matrix = AdjacencyMatrix::build(&topology.node_order, &topology.edges);
        Ok(topology)
    }

    fn insert_node(&mut self, data: NodeData) {
        let id = data.id.clone();
        if self.nodes.insert(id.clone(), data).is_none() {
            self.node_order.push(id.clone());
            self.adjacency.entry(id).or_default();
        }
    }

    fn insert_link(&mut self, link: &Link, timestamp: DateTime<Utc>) {
        for endpoint in [&link.src, &link.dst] {
            if !self.nodes.contains_key(endpoint.as_str()) {
                self.insert_node(NodeData::placeholder(endpoint, timestamp));
            }
        }

        // Safe lookups: both endpoints were just ensured above.
        let weight = match (self.nodes.get(&link.src), self.nodes.get(&link.dst)) {
            (Some(src), Some(dst)) => compose_weight(&link.metrics, link.available, src, dst),
            _ => return,
        };

        let data = EdgeData {
            weight,
            delay_ms: link.metrics.delay_ms,
            jitter_ms: link.metrics.jitter_ms,
            loss_rate: link.metrics.loss_rate,
            bandwidth_mbps: link.metrics.bandwidth_mbps,
            available: link.available,
            last_updated: timestamp,
        };

        let key = edge_key(&link.src, &link.dst);
        if self.edges.insert(key, data).is_none() {
            // First sighting of this pair: wire up adjacency once.
            self.push_neighbor(&link.src, &link.dst);
            if link.src != link.dst {
                self.push_neighbor(&link.dst, &link.src);
            }
        }
    }

    fn push_neighbor(&mut self, from: &str, to: &str) {
        self.adjacency
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Node ids in snapshot insertion order.
    pub fn node_ids(&self) -> &[String] {
        &self.node_order
    }

    /// Neighbors of `id` in link insertion order; empty for unknown ids.
    pub fn neighbors(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, id: &str) -> usize {
        self.neighbors(id).len()
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, u: &str, v: &str) -> Option<&EdgeData> {
        self.edges.get(&edge_key(u, v))
    }

    /// Composite weight of the (u, v) edge, `+∞` when absent.
    pub fn edge_weight(&self, u: &str, v: &str) -> f64 {
        self.edge(u, v).map(|e| e.weight).unwrap_or(f64::INFINITY)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn matrix(&self) -> &AdjacencyMatrix {
        &self.matrix
    }

    /// Smallest incident edge weight of `id`, [`ISOLATED_MIN_WEIGHT`] when
    /// the node has no edges.
    pub fn min_incident_weight(&self, id: &str) -> f64 {
        let mut best = f64::INFINITY;
        for neighbor in self.neighbors(id) {
            best = best.min(self.edge_weight(id, neighbor));
        }
        if best.is_finite() {
            best
        } else {
            ISOLATED_MIN_WEIGHT
        }
    }

    /// Unweighted BFS hop distance from `src` to `dst`.
    pub fn bfs_hops(&self, src: &str, dst: &str) -> Option<usize> {
        if !self.contains(src) || !self.contains(dst) {
            return None;
        }
        if src == dst {
            return Some(0);
        }
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(src);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        queue.push_back((src, 0));
        while let Some((node, hops)) = queue.pop_front() {
            for neighbor in self.neighbors(node) {
                if neighbor == dst {
                    return Some(hops + 1);
                }
                if visited.insert(neighbor) {
                    queue.push_back((neighbor, hops + 1));
                }
            }
        }
        None
    }

    /// Path existence between two nodes.
    pub fn is_connected(&self, src: &str, dst: &str) -> bool {
        self.bfs_hops(src, dst).is_some()
    }

    /// Whether every node is reachable from every other node. Empty graphs
    /// count as disconnected.
    pub fn is_fully_connected(&self) -> bool {
        let Some(start) = self.node_order.first() else {
            return false;
        };
        self.reachable_from(start).len() == self.node_count()
    }

    pub(crate) fn reachable_from(&self, start: &str) -> HashSet<String> {
        let mut visited: HashSet<String> = HashSet::new();
        if !self.contains(start) {
            return visited;
        }
        visited.insert(start.to_string());
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            for neighbor in self.neighbors(node) {
                if !visited.contains(neighbor.as_str()) {
                    visited.insert(neighbor.clone());
                    queue.push_back(neighbor);
                }
            }
        }
        visited
    }

    /// Copy of this topology with the given undirected edges removed and
    /// the adjacency matrix rebuilt. Used for backup-route and k-shortest
    /// searches; the original stays untouched for metric computation.
    pub fn without_edges(&self, removed: &HashSet<(String, String)>) -> Topology {
        let mut masked = self.clone();
        for key in removed {
            let key = edge_key(&key.0, &key.1);
            if masked.edges.remove(&key).is_some() {
                if let Some(list) = masked.adjacency.get_mut(&key.0) {
                    list.retain(|n| *n != key.1);
                }
                if let Some(list) = masked.adjacency.get_mut(&key.1) {
                    list.retain(|n| *n != key.0);
                }
            }
        }
        masked.matrix = AdjacencyMatrix::build(&masked.node_order, &masked.edges);
        masked
    }
}

fn parse_snapshot_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| Error::InvalidSnapshot(format!("timestamp {raw:?}: {err}")))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::protocol::NodeMetrics;

    #[test]
    fn composite_weight_matches_formula() {
        let snapshot = snapshot(
            vec![up_node("a", NodeType::Satellite), up_node("b", NodeType::Ship)],
            vec![link(
                "a",
                "b",
                true,
                LinkMetrics {
                    delay_ms: 10.0,
                    jitter_ms: 1.0,
                    loss_rate: 0.0,
                    bandwidth_mbps: 100.0,
                },
            )],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        let expected = 10.0 + 2.0 + 0.1 * (1000.0 / 101.0);
        assert!((topology.edge_weight("a", "b") - expected).abs() < 1e-9);
    }

    #[test]
    fn node_load_feeds_into_weight() {
        let busy = NodeMetrics {
            cpu_load: 0.8,
            queue_len: 10,
            ..NodeMetrics::default()
        };
        let snapshot = snapshot(
            vec![
                node("a", NodeType::GroundStation, "UP", busy),
                up_node("b", NodeType::GroundStation),
            ],
            vec![clean_link("a", "b", 999.0)],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        let expected = 1.0 + 0.1 * (1000.0 / 1000.0) + (0.8 * 5.0 + 10.0 * 0.5);
        assert!((topology.edge_weight("a", "b") - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_metric_link_hits_the_floor() {
        let snapshot = snapshot(
            vec![up_node("a", NodeType::Ship), up_node("b", NodeType::Ship)],
            vec![link(
                "a",
                "b",
                true,
                LinkMetrics {
                    delay_ms: 0.0,
                    jitter_ms: 0.0,
                    loss_rate: 0.0,
                    bandwidth_mbps: f64::MAX,
                },
            )],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        assert!(topology.edge_weight("a", "b") >= MIN_WEIGHT_FLOOR);
    }

    #[test]
    fn unavailable_link_is_retained_with_penalty() {
        let snapshot = snapshot(
            vec![up_node("a", NodeType::Drone), up_node("b", NodeType::Drone)],
            vec![link("a", "b", false, LinkMetrics::default())],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        assert_eq!(topology.edge_count(), 1);
        assert!(topology.edge_weight("a", "b") >= UNAVAILABLE_LINK_PENALTY);
    }

    #[test]
    fn down_endpoint_dominates_unavailability() {
        let snapshot = snapshot(
            vec![
                node("a", NodeType::Satellite, "DOWN", NodeMetrics::default()),
                up_node("b", NodeType::Satellite),
            ],
            vec![link("a", "b", false, LinkMetrics::default())],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        assert!(topology.edge_weight("a", "b") >= DOWN_NODE_PENALTY);
    }

    #[test]
    fn duplicate_pair_coalesces_last_write_wins() {
        let mut second = clean_link("a", "b", 10.0);
        second.metrics.delay_ms = 42.0;
        let snapshot = snapshot(
            vec![up_node("a", NodeType::Ship), up_node("b", NodeType::Ship)],
            vec![clean_link("b", "a", 10.0), second],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        assert_eq!(topology.edge_count(), 1);
        assert_eq!(topology.neighbors("a"), ["b".to_string()]);
        let edge = topology.edge("a", "b").unwrap();
        assert!((edge.delay_ms - 42.0).abs() < 1e-12);
    }

    #[test]
    fn undeclared_endpoint_becomes_placeholder() {
        let snapshot = snapshot(
            vec![up_node("a", NodeType::GroundStation)],
            vec![clean_link("a", "ghost", 5.0)],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        let ghost = topology.node("ghost").unwrap();
        assert_eq!(ghost.kind, NodeType::Unknown);
        assert!(ghost.is_up());
        assert_eq!(topology.node_count(), 2);
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let bad = GraphSnapshot {
            timestamp: "yesterday-ish".to_string(),
            nodes: vec![],
            links: vec![],
        };
        assert!(matches!(
            Topology::from_snapshot(&bad),
            Err(Error::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn neighbors_of_unknown_node_is_empty() {
        let topology = Topology::from_snapshot(&snapshot(vec![], vec![])).unwrap();
        assert!(topology.neighbors("nope").is_empty());
    }

    #[test]
    fn bfs_and_connectivity() {
        let snapshot = snapshot(
            vec![
                up_node("a", NodeType::Ship),
                up_node("b", NodeType::Ship),
                up_node("c", NodeType::Ship),
                up_node("lone", NodeType::Ship),
            ],
            vec![clean_link("a", "b", 10.0), clean_link("b", "c", 10.0)],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        assert_eq!(topology.bfs_hops("a", "c"), Some(2));
        assert!(topology.is_connected("a", "c"));
        assert!(!topology.is_connected("a", "lone"));
        assert!(!topology.is_fully_connected());
    }

    #[test]
    fn min_incident_weight_defaults_for_isolated_nodes() {
        let snapshot = snapshot(vec![up_node("a", NodeType::Drone)], vec![]);
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        assert!((topology.min_incident_weight("a") - ISOLATED_MIN_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn without_edges_masks_but_preserves_original() {
        let snapshot = snapshot(
            vec![
                up_node("a", NodeType::Ship),
                up_node("b", NodeType::Ship),
                up_node("c", NodeType::Ship),
            ],
            vec![clean_link("a", "b", 10.0), clean_link("b", "c", 10.0)],
        );
        let topology = Topology::from_snapshot(&snapshot).unwrap();
        let mut removed = HashSet::new();
        removed.insert(("b".to_string(), "a".to_string()));
        let masked = topology.without_edges(&removed);
        assert_eq!(masked.edge_count(), 1);
        assert!(masked.edge("a", "b").is_none());
        assert!(!masked.is_connected("a", "b"));
        assert_eq!(topology.edge_count(), 2);
    }
}
