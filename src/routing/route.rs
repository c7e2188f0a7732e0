//! Uniform result contract shared by all routing algorithms.

use serde::{Deserialize, Serialize};

use crate::graph::topology::Topology;

/// A found route with its aggregate link metrics. Metrics are always read
/// from the same topology view the search ran on, never from a newer
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<String>,
    pub total_weight: f64,
    pub total_delay_ms: f64,
    pub total_jitter_ms: f64,
    pub average_loss_rate: f64,
    pub min_bandwidth_mbps: f64,
    pub hop_count: usize,
    pub stability_score: f64,
}

impl Route {
    /// Derive the route record for a path. A trivial path (src = dst) has
    /// zero cost and a perfect stability score.
    pub fn from_path(topology: &Topology, path: Vec<String>) -> Self {
        if path.len() < 2 {
            return Self {
                path,
                total_weight: 0.0,
                total_delay_ms: 0.0,
                total_jitter_ms: 0.0,
                average_loss_rate: 0.0,
                min_bandwidth_mbps: 0.0,
                hop_count: 0,
                stability_score: 1.0,
            };
        }

        let mut total_weight = 0.0;
        let mut total_delay_ms = 0.0;
        let mut total_jitter_ms = 0.0;
        let mut total_loss_rate = 0.0;
        let mut min_bandwidth = f64::INFINITY;
        let mut edge_count = 0usize;

        for pair in path.windows(2) {
            if let Some(edge) = topology.edge(&pair[0], &pair[1]) {
                total_weight += edge.weight;
                total_delay_ms += edge.delay_ms;
                total_jitter_ms += edge.jitter_ms;
                total_loss_rate += edge.loss_rate;
                if edge.bandwidth_mbps > 0.0 {
                    min_bandwidth = min_bandwidth.min(edge.bandwidth_mbps);
                }
                edge_count += 1;
            }
        }

        let average_loss_rate = if edge_count > 0 {
            total_loss_rate / edge_count as f64
        } else {
            0.0
        };
        let min_bandwidth_mbps = if min_bandwidth.is_finite() {
            min_bandwidth
        } else {
            0.0
        };
        let stability_score =
            (1.0 - total_jitter_ms / 1000.0 - average_loss_rate * 10.0).clamp(0.0, 1.0);

        let hop_count = path.len() - 1;
        Self {
            path,
            total_weight,
            total_delay_ms,
            total_jitter_ms,
            average_loss_rate,
            min_bandwidth_mbps,
            hop_count,
            stability_score,
        }
    }
}
