//! Service facade tying the graph store, routing engine and stability
//! analyzer together.
//!
//! This is the only layer that turns internal error kinds into
//! transport-shaped responses. All methods take `&self` and are safe to
//! call from many tasks at once; route queries run against a pinned view
//! and cannot observe a snapshot mid-application.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::analysis::{MetricSample, NetworkStability, StabilityAnalyzer, StabilityMetrics};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graph::{Centrality, GraphStats, GraphStore};
use crate::protocol::{
    AlgorithmRunRequest, AlgorithmStep, GraphSnapshot, Link, Node, RouteRequest, RouteResponse,
    StreamEvent, UpdateResponse,
};
use crate::routing::{CancelToken, Route, RoutingEngine};

/// Default number of critical nodes reported.
pub const DEFAULT_CRITICAL_NODES: usize = 5;

/// The advisor core behind the transport collaborator.
pub struct AdvisorService {
    config: Config,
    store: Arc<GraphStore>,
    engine: RoutingEngine,
    analyzer: StabilityAnalyzer,
}

impl AdvisorService {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(GraphStore::new());
        let engine = RoutingEngine::new(Arc::clone(&store));
        let analyzer = StabilityAnalyzer::new(config.history_window, config.ema_smoothing);
        Self {
            config,
            store,
            engine,
            analyzer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn analyzer(&self) -> &StabilityAnalyzer {
        &self.analyzer
    }

    /// Replace the graph with the snapshot and, on success, fan its
    /// metrics into the stability history under the snapshot timestamp.
    pub fn apply_snapshot(&self, snapshot: &GraphSnapshot) -> UpdateResponse {
        match self.store.apply_snapshot(snapshot) {
            Ok(summary) => {
                if let Some(timestamp) = self.store.last_update() {
                    self.ingest_metrics(snapshot, timestamp);
                }
                UpdateResponse {
                    success: true,
                    message: format!(
                        "Graph updated successfully with {} nodes and {} links",
                        summary.nodes, summary.links
                    ),
                }
            }
            Err(err) => {
                warn!(
                    component = "advisor_service",
                    operation = "apply_snapshot",
                    %err,
                    "snapshot rejected"
                );
                UpdateResponse {
                    success: false,
                    message: err.to_string(),
                }
            }
        }
    }

    fn ingest_metrics(&self, snapshot: &GraphSnapshot, timestamp: DateTime<Utc>) {
        for node in &snapshot.nodes {
            self.analyzer
                .update_node_metrics(&node.id, timestamp, &node_metric_pairs(node));
        }
        for link in &snapshot.links {
            self.analyzer.update_link_metrics(
                &link_history_id(link),
                timestamp,
                &link_metric_pairs(link),
            );
        }
    }

    /// Answer one route query.
    pub fn request_route(&self, request: &RouteRequest) -> RouteResponse {
        let src = &request.source_node_id;
        let dst = &request.destination_node_id;
        let outcome = self.engine.find_optimal_route(
            src,
            dst,
            request.algorithm,
            None,
            &CancelToken::new(),
        );

        match outcome {
            Ok(Some(route)) => {
                info!(
                    component = "advisor_service",
                    operation = "request_route",
                    algo = %request.algorithm,
                    src = %src,
                    dst = %dst,
                    hops = route.hop_count,
                    "route found"
                );
                RouteResponse {
                    success: true,
                    path: route.path.clone(),
                    total_weight: route.total_weight,
                    total_delay_ms: route.total_delay_ms,
                    stability_score: route.stability_score,
                    hop_count: route.hop_count,
                    message: String::new(),
                }
            }
            Ok(None) => RouteResponse {
                success: false,
                message: format!("No route found from {src} to {dst}"),
                ..RouteResponse::default()
            },
            Err(err) => {
                error!(
                    component = "advisor_service",
                    operation = "request_route",
                    src = %src,
                    dst = %dst,
                    %err,
                    "route query failed"
                );
                RouteResponse {
                    success: false,
                    message: format!("Route calculation error: {err}"),
                    ..RouteResponse::default()
                }
            }
        }
    }

    /// Run an algorithm and stream its progress: one `RunStart`, the
    /// ordered steps, then one `Complete` with the result (if any). A
    /// cancelled run stops without emitting `Complete`; an internal error
    /// emits `Complete` without a result and is also returned.
    pub fn run_algorithm_stream(
        &self,
        request: &AlgorithmRunRequest,
        events: &UnboundedSender<StreamEvent>,
        cancel: &CancelToken,
    ) -> Result<Option<Route>> {
        let _ = events.send(StreamEvent::RunStart {
            algo: request.algo,
            src: request.src.clone(),
            dst: request.dst.clone(),
        });

        let forward_to = events.clone();
        let mut forward = move |step: AlgorithmStep| {
            let _ = forward_to.send(StreamEvent::Step(step));
        };

        let outcome = self.engine.find_optimal_route(
            &request.src,
            &request.dst,
            request.algo,
            Some(&mut forward),
            cancel,
        );

        match outcome {
            Ok(route) => {
                let _ = events.send(StreamEvent::Complete {
                    algo: request.algo,
                    src: request.src.clone(),
                    dst: request.dst.clone(),
                    result: route.clone(),
                });
                Ok(route)
            }
            Err(Error::Cancelled) => {
                info!(
                    component = "advisor_service",
                    operation = "run_algorithm_stream",
                    algo = %request.algo,
                    src = %request.src,
                    dst = %request.dst,
                    "run cancelled"
                );
                Err(Error::Cancelled)
            }
            Err(err) => {
                error!(
                    component = "advisor_service",
                    operation = "run_algorithm_stream",
                    algo = %request.algo,
                    src = %request.src,
                    dst = %request.dst,
                    %err,
                    "algorithm failed"
                );
                let _ = events.send(StreamEvent::Complete {
                    algo: request.algo,
                    src: request.src.clone(),
                    dst: request.dst.clone(),
                    result: None,
                });
                Err(err)
            }
        }
    }

    /// Up to `k` distinct paths ordered by total weight.
    pub fn k_shortest_paths(&self, src: &str, dst: &str, k: usize) -> Vec<Route> {
        self.engine.k_shortest_paths(src, dst, k)
    }

    /// Edge-disjoint alternative to an already-chosen primary path.
    pub fn backup_routes(&self, src: &str, dst: &str, primary: &[String]) -> Vec<Route> {
        self.engine.backup_routes(src, dst, primary)
    }

    pub fn graph_stats(&self) -> GraphStats {
        self.store.stats()
    }

    pub fn node_centralities(&self) -> HashMap<String, Centrality> {
        self.store.centralities()
    }

    pub fn critical_nodes(&self, top_n: usize) -> Vec<String> {
        self.store.critical_nodes(top_n)
    }

    pub fn network_stability(&self) -> NetworkStability {
        self.analyzer.network_stability()
    }

    pub fn node_stability(&self, node_id: &str, metric: &str) -> Option<StabilityMetrics> {
        self.analyzer.node_stability(node_id, metric)
    }

    pub fn link_stability(&self, link_id: &str, metric: &str) -> Option<StabilityMetrics> {
        self.analyzer.link_stability(link_id, metric)
    }

    pub fn predict_next_value(&self, node_id: &str, metric: &str) -> f64 {
        self.analyzer.predict_next_value(node_id, metric)
    }

    pub fn detect_anomalies(&self, node_id: &str, metric: &str, threshold: f64) -> Vec<MetricSample> {
        self.analyzer.detect_anomalies(node_id, metric, threshold)
    }
}

/// History entity id for a link, as `src_dst`.
fn link_history_id(link: &Link) -> String {
    format!("{}_{}", link.src, link.dst)
}

fn node_metric_pairs(node: &Node) -> [(&'static str, f64); 4] {
    [
        ("cpu_load", node.metrics.cpu_load),
        ("jitter_ms", node.metrics.jitter_ms),
        ("queue_len", f64::from(node.metrics.queue_len)),
        ("throughput_mbps", node.metrics.throughput_mbps),
    ]
}

fn link_metric_pairs(link: &Link) -> [(&'static str, f64); 4] {
    [
        ("delay_ms", link.metrics.delay_ms),
        ("jitter_ms", link.metrics.jitter_ms),
        ("loss_rate", link.metrics.loss_rate),
        ("bandwidth_mbps", link.metrics.bandwidth_mbps),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EntityKind;
    use crate::graph::topology::test_support::*;
    use crate::protocol::{AlgorithmKind, NodeType};
    use tokio::sync::mpsc::unbounded_channel;

    fn service() -> AdvisorService {
        AdvisorService::new(Config::default())
    }

    fn drain(mut rx: tokio::sync::mpsc::UnboundedReceiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn rejected_snapshot_reports_reason_and_keeps_state() {
        let service = service();
        service.apply_snapshot(&snapshot(
            vec![up_node("a", NodeType::Ship), up_node("b", NodeType::Ship)],
            vec![clean_link("a", "b", 10.0)],
        ));

        let mut bad = snapshot(vec![up_node("c", NodeType::Ship)], vec![]);
        bad.timestamp = "??".to_string();
        let response = service.apply_snapshot(&bad);
        assert!(!response.success);
        assert!(response.message.contains("snapshot rejected"));
        assert_eq!(service.store().node_count(), 2);
        // The bad snapshot's node never reached the history either.
        assert!(service
            .analyzer()
            .history()
            .history(EntityKind::Node, "c", "cpu_load")
            .is_empty());
    }

    #[test]
    fn snapshot_ingests_history_under_its_timestamp() {
        let service = service();
        let response = service.apply_snapshot(&snapshot(
            vec![up_node("a", NodeType::Ship)],
            vec![clean_link("a", "b", 10.0)],
        ));
        assert!(response.success);
        assert!(response.message.contains("1 nodes and 1 links"));

        let samples = service
            .analyzer()
            .history()
            .history(EntityKind::Node, "a", "cpu_load");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp, service.store().last_update().unwrap());
        let link_samples = service
            .analyzer()
            .history()
            .history(EntityKind::Link, "a_b", "delay_ms");
        assert_eq!(link_samples.len(), 1);
    }

    #[test]
    fn no_route_is_a_structured_response() {
        let service = service();
        service.apply_snapshot(&snapshot(
            vec![up_node("a", NodeType::Ship), up_node("b", NodeType::Ship)],
            vec![],
        ));
        let response = service.request_route(&RouteRequest {
            source_node_id: "a".to_string(),
            destination_node_id: "b".to_string(),
            algorithm: AlgorithmKind::Dijkstra,
        });
        assert!(!response.success);
        assert_eq!(response.message, "No route found from a to b");
        assert!(response.path.is_empty());
    }

    #[test]
    fn stream_wraps_steps_between_run_start_and_complete() {
        let service = service();
        service.apply_snapshot(&snapshot(
            vec![up_node("a", NodeType::Ship), up_node("b", NodeType::Ship)],
            vec![clean_link("a", "b", 10.0)],
        ));

        let (tx, rx) = unbounded_channel();
        let route = service
            .run_algorithm_stream(
                &AlgorithmRunRequest {
                    algo: AlgorithmKind::Dijkstra,
                    src: "a".to_string(),
                    dst: "b".to_string(),
                },
                &tx,
                &CancelToken::new(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(route.path, vec!["a", "b"]);

        let events = drain(rx);
        assert!(matches!(events.first(), Some(StreamEvent::RunStart { .. })));
        match events.last() {
            Some(StreamEvent::Complete { result: Some(r), .. }) => {
                assert_eq!(r.path, vec!["a", "b"]);
            }
            other => panic!("expected Complete with result, got {other:?}"),
        }
        assert!(events
            .iter()
            .skip(1)
            .take(events.len() - 2)
            .all(|e| matches!(e, StreamEvent::Step(_))));
    }

    #[test]
    fn cancelled_stream_emits_no_complete() {
        let service = service();
        service.apply_snapshot(&snapshot(
            vec![up_node("a", NodeType::Ship), up_node("b", NodeType::Ship)],
            vec![clean_link("a", "b", 10.0)],
        ));

        let cancel = CancelToken::new();
        cancel.cancel();
        let (tx, rx) = unbounded_channel();
        let outcome = service.run_algorithm_stream(
            &AlgorithmRunRequest {
                algo: AlgorithmKind::Astar,
                src: "a".to_string(),
                dst: "b".to_string(),
            },
            &tx,
            &cancel,
        );
        assert!(matches!(outcome, Err(Error::Cancelled)));
        let events = drain(rx);
        assert!(!events
            .iter()
            .any(|e| matches!(e, StreamEvent::Complete { .. })));
    }
}
