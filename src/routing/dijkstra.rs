//! Dijkstra shortest-path search.
//!
//! Textbook non-decreasing-key relaxation over a binary heap; stale heap
//! entries are skipped on pop. The search stops as soon as the destination
//! is dequeued.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{Error, Result};
use crate::graph::topology::Topology;
use crate::routing::astar::reconstruct;
use crate::routing::step::{CancelToken, StepTracer};

struct QueueEntry {
    dist: f64,
    node: String,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; id as a deterministic tie-break.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Run Dijkstra between two nodes on a pinned topology view.
pub fn find_route(
    topology: &Topology,
    src: &str,
    dst: &str,
    tracer: &mut StepTracer<'_>,
    cancel: &CancelToken,
) -> Result<Option<Vec<String>>> {
    let path = shortest_path(topology, src, dst, Some(tracer), cancel)?;
    Ok(path.map(|(path, _)| path))
}

/// Dijkstra core shared with the engine's k-shortest and backup queries,
/// which run it silently on masked topologies.
pub(crate) fn shortest_path(
    topology: &Topology,
    src: &str,
    dst: &str,
    mut tracer: Option<&mut StepTracer<'_>>,
    cancel: &CancelToken,
) -> Result<Option<(Vec<String>, f64)>> {
    if !topology.contains(src) || !topology.contains(dst) {
        return Ok(None);
    }

    let mut dist: HashMap<String, f64> = HashMap::new();
    let mut came_from: HashMap<String, String> = HashMap::new();
    let mut queue = BinaryHeap::new();

    dist.insert(src.to_string(), 0.0);
    queue.push(QueueEntry {
        dist: 0.0,
        node: src.to_string(),
    });

    while let Some(entry) = queue.pop() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let best = dist.get(&entry.node).copied().unwrap_or(f64::INFINITY);
        if entry.dist > best {
            continue; // stale entry
        }
        if let Some(tracer) = tracer.as_deref_mut() {
            tracer.expand(&entry.node, queue.len(), None, None, Some(entry.dist));
        }

        if entry.node == dst {
            let path = reconstruct(&came_from, src, dst);
            if let Some(tracer) = tracer.as_deref_mut() {
                tracer.complete(Some(dst), Some(&path), None, Some(entry.dist));
            }
            return Ok(Some((path, entry.dist)));
        }

        for neighbor in topology.neighbors(&entry.node) {
            let candidate = entry.dist + topology.edge_weight(&entry.node, neighbor);
            let known = dist.get(neighbor).copied().unwrap_or(f64::INFINITY);
            if candidate < known {
                dist.insert(neighbor.clone(), candidate);
                came_from.insert(neighbor.clone(), entry.node.clone());
                if let Some(tracer) = tracer.as_deref_mut() {
                    tracer.relax(&entry.node, neighbor, candidate);
                }
                queue.push(QueueEntry {
                    dist: candidate,
                    node: neighbor.clone(),
                });
            }
        }
    }

    if let Some(tracer) = tracer.as_deref_mut() {
        tracer.complete(None, None, None, None);
    }
    Ok(None)
}
