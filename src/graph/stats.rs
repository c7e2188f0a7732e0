//! Whole-graph statistics and centrality measures.
//!
//! All measures treat the graph as unweighted and undirected; the composite
//! edge weights only matter to the routing algorithms. Centralities follow
//! the usual normalizations: degree `deg/(n-1)`, Brandes betweenness scaled
//! by `1/((n-1)(n-2))`, closeness `(n-1)/Σd` on connected graphs and 0
//! otherwise.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::graph::topology::Topology;

/// Aggregate descriptive statistics for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub connected: bool,
    pub average_degree: f64,
    pub density: f64,
    /// Longest shortest path in hops; only defined for connected graphs.
    pub diameter: Option<usize>,
    pub clustering_coefficient: f64,
    pub last_update: Option<DateTime<Utc>>,
}

/// Per-node centrality triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centrality {
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
}

pub fn graph_stats(topology: &Topology) -> GraphStats {
    let n = topology.node_count();
    if n == 0 {
        return GraphStats {
            nodes: 0,
            edges: 0,
            connected: false,
            average_degree: 0.0,
            density: 0.0,
            diameter: None,
            clustering_coefficient: 0.0,
            last_update: topology.timestamp(),
        };
    }

    let m = topology.edge_count();
    let connected = topology.is_fully_connected();
    let degree_sum: usize = topology.node_ids().iter().map(|id| topology.degree(id)).sum();
    let density = if n > 1 {
        (2 * m) as f64 / (n * (n - 1)) as f64
    } else {
        0.0
    };

    GraphStats {
        nodes: n,
        edges: m,
        connected,
        average_degree: degree_sum as f64 / n as f64,
        density,
        diameter: if connected { diameter(topology) } else { None },
        clustering_coefficient: average_clustering(topology),
        last_update: topology.timestamp(),
    }
}

fn diameter(topology: &Topology) -> Option<usize> {
    let mut max_ecc = 0usize;
    for id in topology.node_ids() {
        let dist = bfs_distances(topology, id);
        if dist.len() != topology.node_count() {
            return None;
        }
        let ecc = dist.values().copied().max().unwrap_or(0);
        max_ecc = max_ecc.max(ecc);
    }
    Some(max_ecc)
}

fn bfs_distances(topology: &Topology, start: &str) -> HashMap<String, usize> {
    let mut dist: HashMap<String, usize> = HashMap::new();
    dist.insert(start.to_string(), 0);
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(start.to_string());
    while let Some(node) = queue.pop_front() {
        let d = dist[&node];
        for neighbor in topology.neighbors(&node) {
            if !dist.contains_key(neighbor) {
                dist.insert(neighbor.clone(), d + 1);
                queue.push_back(neighbor.clone());
            }
        }
    }
    dist
}

fn average_clustering(topology: &Topology) -> f64 {
    let n = topology.node_count();
    if n == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for id in topology.node_ids() {
        total += local_clustering(topology, id);
    }
    total / n as f64
}

fn local_clustering(topology: &Topology, id: &str) -> f64 {
    let neighbors = topology.neighbors(id);
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }
    let mut closed = 0usize;
    for i in 0..k {
        for j in (i + 1)..k {
            if topology.edge(&neighbors[i], &neighbors[j]).is_some() {
                closed += 1;
            }
        }
    }
    (2 * closed) as f64 / (k * (k - 1)) as f64
}

/// Degree, betweenness and closeness for every node.
pub fn centralities(topology: &Topology) -> HashMap<String, Centrality> {
    let n = topology.node_count();
    let mut result = HashMap::with_capacity(n);
    if n == 0 {
        return result;
    }

    let betweenness = betweenness_centrality(topology);
    let connected = topology.is_fully_connected();

    for id in topology.node_ids() {
        let degree = if n > 1 {
            topology.degree(id) as f64 / (n - 1) as f64
        } else {
            0.0
        };
        let closeness = if connected && n > 1 {
            let total: usize = bfs_distances(topology, id).values().sum();
            if total > 0 {
                (n - 1) as f64 / total as f64
            } else {
                0.0
            }
        } else {
            0.0
        };
        result.insert(
            id.clone(),
            Centrality {
                degree,
                betweenness: betweenness.get(id).copied().unwrap_or(0.0),
                closeness,
            },
        );
    }
    result
}

/// Brandes' algorithm over unweighted shortest paths.
fn betweenness_centrality(topology: &Topology) -> HashMap<String, f64> {
    let n = topology.node_count();
    let mut centrality: HashMap<String, f64> =
        topology.node_ids().iter().map(|id| (id.clone(), 0.0)).collect();
    if n <= 2 {
        return centrality;
    }

    for source in topology.node_ids() {
        let mut stack: Vec<String> = Vec::new();
        let mut predecessors: HashMap<String, Vec<String>> = HashMap::new();
        let mut sigma: HashMap<String, f64> = HashMap::new();
        let mut dist: HashMap<String, i64> = HashMap::new();

        sigma.insert(source.clone(), 1.0);
        dist.insert(source.clone(), 0);
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(source.clone());

        while let Some(v) = queue.pop_front() {
            stack.push(v.clone());
            let dv = dist[&v];
            let sv = sigma[&v];
            for w in topology.neighbors(&v) {
                if !dist.contains_key(w) {
                    dist.insert(w.clone(), dv + 1);
                    queue.push_back(w.clone());
                }
                if dist[w] == dv + 1 {
                    *sigma.entry(w.clone()).or_insert(0.0) += sv;
                    predecessors.entry(w.clone()).or_default().push(v.clone());
                }
            }
        }

        let mut delta: HashMap<String, f64> = HashMap::new();
        while let Some(w) = stack.pop() {
            let dw = delta.get(&w).copied().unwrap_or(0.0);
            let sw = sigma[&w];
            if let Some(preds) = predecessors.get(&w) {
                for v in preds {
                    let share = sigma[v] / sw * (1.0 + dw);
                    *delta.entry(v.clone()).or_insert(0.0) += share;
                }
            }
            if w != *source {
                *centrality.entry(w).or_insert(0.0) += dw;
            }
        }
    }

    // Both traversal directions were accumulated, so this matches the
    // normalized undirected convention.
    let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
    for value in centrality.values_mut() {
        *value *= scale;
    }
    centrality
}

/// Nodes ranked by `0.4·degree + 0.4·betweenness + 0.2·closeness`; ties go
/// to the higher raw degree, then the lexicographically smaller id.
pub fn critical_nodes(topology: &Topology, top_n: usize) -> Vec<String> {
    let centralities = centralities(topology);
    if centralities.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(String, f64, usize)> = centralities
        .into_iter()
        .map(|(id, c)| {
            let score = 0.4 * c.degree + 0.4 * c.betweenness + 0.2 * c.closeness;
            let degree = topology.degree(&id);
            (id, score, degree)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| a.0.cmp(&b.0))
    });

    scored.into_iter().take(top_n).map(|(id, _, _)| id).collect()
}
