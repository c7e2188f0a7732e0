//! Greedy hop-by-hop routing.
//!
//! At every node the walk moves to the unvisited neighbor with the best
//! blend of local edge weight and type affinity toward the destination.
//! Cheap and myopic: it can dead-end where the exact algorithms would
//! succeed, which is exactly the behavior observers want to watch.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::graph::topology::Topology;
use crate::protocol::NodeType;
use crate::routing::step::{CancelToken, StepTracer};

const WEIGHT_BLEND: f64 = 0.6;
const AFFINITY_BLEND: f64 = 0.4;
const SAME_TYPE_AFFINITY: f64 = 5.0;
const PRIORITY_GAP_FACTOR: f64 = 15.0;
const MOBILITY_PENALTY: f64 = 10.0;

fn type_priority(kind: NodeType) -> f64 {
    match kind {
        NodeType::GroundStation => 1.0,
        NodeType::Satellite => 2.0,
        NodeType::Ship => 3.0,
        NodeType::Drone => 4.0,
        NodeType::MobileDevice => 5.0,
        NodeType::Unknown => 6.0,
    }
}

/// Affinity of `candidate` toward `dst`: same type is cheap, distant
/// priority classes are expensive, and inherently mobile nodes carry an
/// extra penalty.
fn type_affinity(topology: &Topology, candidate: &str, dst: &str) -> f64 {
    if candidate == dst {
        return 0.0;
    }
    let candidate_kind = topology
        .node(candidate)
        .map(|n| n.kind)
        .unwrap_or(NodeType::Unknown);
    let dst_kind = topology
        .node(dst)
        .map(|n| n.kind)
        .unwrap_or(NodeType::Unknown);

    let mut affinity = if candidate_kind == dst_kind {
        SAME_TYPE_AFFINITY
    } else {
        PRIORITY_GAP_FACTOR * (type_priority(candidate_kind) - type_priority(dst_kind)).abs()
    };
    if matches!(candidate_kind, NodeType::MobileDevice | NodeType::Drone) {
        affinity += MOBILITY_PENALTY;
    }
    affinity
}

/// Run the greedy walk. Fails (returns `None`) on a dead end or when the
/// walk exceeds the node count, its cycle safety bound.
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

    let mut visited: HashSet<String> = HashSet::new();
    let mut path = vec![src.to_string()];
    let mut current = src.to_string();

    while current != dst {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        visited.insert(current.clone());

        let mut best: Option<(f64, &String)> = None;
        for neighbor in topology.neighbors(&current) {
            if visited.contains(neighbor) {
                continue;
            }
            let score = WEIGHT_BLEND * topology.edge_weight(&current, neighbor)
                + AFFINITY_BLEND * type_affinity(topology, neighbor, dst);
            // Strict comparison keeps the first minimum in adjacency order.
            if best.map(|(s, _)| score < s).unwrap_or(true) {
                best = Some((score, neighbor));
            }
        }

        let Some((_, next)) = best else {
            tracer.complete(None, None, None, None);
            return Ok(None);
        };

        tracer.select(&current, next);
        path.push(next.clone());
        current = next.clone();

        if path.len() > topology.node_count() {
            tracer.complete(None, None, None, None);
            return Ok(None);
        }
    }

    tracer.complete(Some(dst), Some(&path), None, None);
    Ok(Some(path))
}
