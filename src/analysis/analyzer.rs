//! Rolling stability analysis over the metric history.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::analysis::history::{EntityKind, MetricSample, MetricsHistory};
use crate::analysis::stability::{self, NetworkStability, StabilityMetrics};

/// Analyzer facade over the bounded history.
#[derive(Debug)]
pub struct StabilityAnalyzer {
    history: MetricsHistory,
}

impl StabilityAnalyzer {
    pub fn new(window: usize, smoothing: f64) -> Self {
        Self {
            history: MetricsHistory::new(window, smoothing),
        }
    }

    pub fn history(&self) -> &MetricsHistory {
        &self.history
    }

    /// Fan one node's metric tuple into the history.
    pub fn update_node_metrics(
        &self,
        node_id: &str,
        timestamp: DateTime<Utc>,
        metrics: &[(&str, f64)],
    ) {
        for (name, value) in metrics {
            self.history
                .record(EntityKind::Node, node_id, name, *value, timestamp);
        }
    }

    /// Fan one link's metric tuple into the history.
    pub fn update_link_metrics(
        &self,
        link_id: &str,
        timestamp: DateTime<Utc>,
        metrics: &[(&str, f64)],
    ) {
        for (name, value) in metrics {
            self.history
                .record(EntityKind::Link, link_id, name, *value, timestamp);
        }
    }

    /// Stability of one (node, metric) series; `None` below two samples.
    pub fn node_stability(&self, node_id: &str, metric: &str) -> Option<StabilityMetrics> {
        self.entity_stability(EntityKind::Node, node_id, metric)
    }

    /// Stability of one (link, metric) series; `None` below two samples.
    pub fn link_stability(&self, link_id: &str, metric: &str) -> Option<StabilityMetrics> {
        self.entity_stability(EntityKind::Link, link_id, metric)
    }

    fn entity_stability(
        &self,
        kind: EntityKind,
        entity: &str,
        metric: &str,
    ) -> Option<StabilityMetrics> {
        if !self.history.has_enough_data(kind, entity, metric) {
            return None;
        }
        let values: Vec<f64> = self
            .history
            .history(kind, entity, metric)
            .iter()
            .map(|s| s.value)
            .collect();
        Some(stability::series_metrics(&values))
    }

    /// Weighted aggregate over every measured metric of one node.
    pub fn overall_node_stability(&self, node_id: &str) -> Option<f64> {
        self.overall_entity_stability(EntityKind::Node, node_id)
    }

    /// Weighted aggregate over every measured metric of one link.
    pub fn overall_link_stability(&self, link_id: &str) -> Option<f64> {
        self.overall_entity_stability(EntityKind::Link, link_id)
    }

    fn overall_entity_stability(&self, kind: EntityKind, entity: &str) -> Option<f64> {
        let mut scores = std::collections::HashMap::new();
        for metric in self.history.metric_names(kind, entity) {
            if let Some(metrics) = self.entity_stability(kind, entity, &metric) {
                scores.insert(metric, metrics.stability_score);
            }
        }
        if scores.is_empty() {
            return None;
        }
        Some(stability::weighted_entity_score(&scores, kind))
    }

    /// Whole-network rollup over every entity with enough data.
    pub fn network_stability(&self) -> NetworkStability {
        let node_scores: Vec<f64> = self
            .history
            .entity_ids(EntityKind::Node)
            .iter()
            .filter_map(|id| self.overall_node_stability(id))
            .collect();
        let link_scores: Vec<f64> = self
            .history
            .entity_ids(EntityKind::Link)
            .iter()
            .filter_map(|id| self.overall_link_stability(id))
            .collect();
        let rollup = stability::network_stability(&node_scores, &link_scores);
        debug!(
            component = "stability_analyzer",
            nodes = node_scores.len(),
            links = link_scores.len(),
            overall = rollup.overall,
            "network stability computed"
        );
        rollup
    }

    /// EMA forecast of a node metric's next value.
    pub fn predict_next_value(&self, node_id: &str, metric: &str) -> f64 {
        self.history.ema(EntityKind::Node, node_id, metric)
    }

    /// Samples of a node metric that deviate past the z-score threshold;
    /// pass [`stability::DEFAULT_ANOMALY_THRESHOLD`] for the standard
    /// cutoff.
    pub fn detect_anomalies(
        &self,
        node_id: &str,
        metric: &str,
        threshold: f64,
    ) -> Vec<MetricSample> {
        let Some(metrics) = self.node_stability(node_id, metric) else {
            return Vec::new();
        };
        let samples = self.history.history(EntityKind::Node, node_id, metric);
        stability::detect_anomalies(&samples, &metrics, threshold)
    }
}
