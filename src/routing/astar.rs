//! A* best-first search with a topology-based heuristic.
//!
//! The heuristic estimates remaining cost as the node's cheapest incident
//! edge times its unweighted hop distance to the destination; when BFS
//! cannot reach the destination the hop count falls back to a small
//! type-based estimate. Ties on `f` break toward the lower `g`, then the
//! lexicographically smaller node id, which keeps expansion order
//! deterministic.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::graph::topology::Topology;
use crate::protocol::NodeType;
use crate::routing::step::{CancelToken, StepTracer};

struct OpenEntry {
    f: f64,
    g: f64,
    node: String,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the smallest (f, g, id) triple.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.g.total_cmp(&self.g))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Remaining-cost estimates toward one fixed destination.
struct Heuristic<'t> {
    topology: &'t Topology,
    dst: String,
    dst_kind: NodeType,
    /// Unweighted hop distances to the destination, computed once.
    hops_to_dst: HashMap<String, usize>,
    min_weight_cache: HashMap<String, f64>,
}

impl<'t> Heuristic<'t> {
    fn new(topology: &'t Topology, dst: &str) -> Self {
        let mut hops_to_dst = HashMap::new();
        // BFS from dst; hop distances are symmetric on an undirected graph.
        if topology.contains(dst) {
            hops_to_dst.insert(dst.to_string(), 0);
            let mut queue = std::collections::VecDeque::new();
            queue.push_back(dst.to_string());
            while let Some(node) = queue.pop_front() {
                let d = hops_to_dst[&node];
                for neighbor in topology.neighbors(&node) {
                    if !hops_to_dst.contains_key(neighbor) {
                        hops_to_dst.insert(neighbor.clone(), d + 1);
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }
        let dst_kind = topology
            .node(dst)
            .map(|n| n.kind)
            .unwrap_or(NodeType::Unknown);
        Self {
            topology,
            dst: dst.to_string(),
            dst_kind,
            hops_to_dst,
            min_weight_cache: HashMap::new(),
        }
    }

    fn estimate(&mut self, node: &str) -> f64 {
        if node == self.dst {
            return 0.0;
        }
        let hops = match self.hops_to_dst.get(node) {
            Some(&h) => h,
            None => self.fallback_hops(node),
        };
        self.min_outgoing_weight(node) * hops.max(1) as f64
    }

    /// Type-based hop guess when the destination is unreachable by BFS.
    fn fallback_hops(&self, node: &str) -> usize {
        let kind = self
            .topology
            .node(node)
            .map(|n| n.kind)
            .unwrap_or(NodeType::Unknown);
        if kind == self.dst_kind {
            1
        } else if kind == NodeType::GroundStation || self.dst_kind == NodeType::GroundStation {
            2
        } else {
            3
        }
    }

    fn min_outgoing_weight(&mut self, node: &str) -> f64 {
        if let Some(&cached) = self.min_weight_cache.get(node) {
            return cached;
        }
        let weight = self.topology.min_incident_weight(node);
        self.min_weight_cache.insert(node.to_string(), weight);
        weight
    }
}

/// Run A* between two nodes on a pinned topology view. Returns the path or
/// `None` when the open set drains without reaching the destination.
pub fn find_route(
    topology: &Topology,
    src: &str,
    dst: &str,
    tracer: &mut StepTracer<'_>,
    cancel: &CancelToken,
) -> Result<Option<Vec<String>>> {
    if !topology.contains(src) || !topology.contains(dst) {
        return Ok(None);
    }

    let mut heuristic = Heuristic::new(topology, dst);
    let mut g_score: HashMap<String, f64> = HashMap::new();
    let mut came_from: HashMap<String, String> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut open = BinaryHeap::new();

    g_score.insert(src.to_string(), 0.0);
    open.push(OpenEntry {
        f: heuristic.estimate(src),
        g: 0.0,
        node: src.to_string(),
    });

    while let Some(entry) = open.pop() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if visited.contains(&entry.node) {
            continue;
        }
        tracer.expand(&entry.node, open.len(), Some(entry.g), Some(entry.f), None);

        if entry.node == dst {
            let path = reconstruct(&came_from, src, dst);
            tracer.complete(Some(dst), Some(&path), Some(entry.g), None);
            return Ok(Some(path));
        }
        visited.insert(entry.node.clone());

        for neighbor in topology.neighbors(&entry.node) {
            if visited.contains(neighbor) {
                continue;
            }
            let tentative = entry.g + topology.edge_weight(&entry.node, neighbor);
            let best = g_score.get(neighbor).copied().unwrap_or(f64::INFINITY);
            if tentative < best {
                g_score.insert(neighbor.clone(), tentative);
                came_from.insert(neighbor.clone(), entry.node.clone());
                let f = tentative + heuristic.estimate(neighbor);
                tracer.consider(&entry.node, neighbor, tentative, f);
                open.push(OpenEntry {
                    f,
                    g: tentative,
                    node: neighbor.clone(),
                });
            }
        }
    }

    tracer.complete(None, None, None, None);
    Ok(None)
}

pub(crate) fn reconstruct(
    came_from: &HashMap<String, String>,
    src: &str,
    dst: &str,
) -> Vec<String> {
    let mut path = vec![dst.to_string()];
    let mut current = dst;
    while current != src {
        match came_from.get(current) {
            Some(prev) => {
                path.push(prev.clone());
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
