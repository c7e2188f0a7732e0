//! Routing engine: algorithm dispatch plus the multi-path queries.
//!
//! Every query pins one topology view up front, so concurrent snapshot
//! swaps cannot change the graph under a running search, and all route
//! metrics are computed against exactly the view that was searched.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::graph::store::GraphStore;
use crate::graph::topology::{edge_key, Topology};
use crate::protocol::AlgorithmKind;
use crate::routing::step::{CancelToken, StepSink, StepTracer};
use crate::routing::{astar, dijkstra, greedy, Route};

pub struct RoutingEngine {
    store: Arc<GraphStore>,
}

impl RoutingEngine {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Run the selected algorithm. Unknown endpoints resolve to `Ok(None)`
    /// rather than an error; the caller decides how to phrase "no route".
    pub fn find_optimal_route(
        &self,
        src: &str,
        dst: &str,
        algo: AlgorithmKind,
        sink: Option<&mut dyn StepSink>,
        cancel: &CancelToken,
    ) -> Result<Option<Route>> {
        let view = self.store.view();
        let mut tracer = StepTracer::new(algo, sink);
        let path = match algo {
            AlgorithmKind::Astar => astar::find_route(&view, src, dst, &mut tracer, cancel)?,
            AlgorithmKind::Dijkstra => dijkstra::find_route(&view, src, dst, &mut tracer, cancel)?,
            AlgorithmKind::Greedy => greedy::find_route(&view, src, dst, &mut tracer, cancel)?,
        };
        debug!(
            component = "routing_engine",
            %algo,
            src,
            dst,
            found = path.is_some(),
            "route query finished"
        );
        Ok(path.map(|p| Route::from_path(&view, p)))
    }

    /// Up to `k` distinct simple paths in non-decreasing total weight
    /// (Yen's algorithm).
    pub fn k_shortest_paths(&self, src: &str, dst: &str, k: usize) -> Vec<Route> {
        let view = self.store.view();
        let cancel = CancelToken::new();
        if k == 0 || !view.contains(src) || !view.contains(dst) {
            return Vec::new();
        }

        let Ok(Some((first_path, first_cost))) =
            dijkstra::shortest_path(&view, src, dst, None, &cancel)
        else {
            return Vec::new();
        };

        let mut accepted: Vec<(Vec<String>, f64)> = vec![(first_path, first_cost)];
        let mut seen: HashSet<Vec<String>> = accepted.iter().map(|(p, _)| p.clone()).collect();
        let mut candidates: Vec<(Vec<String>, f64)> = Vec::new();

        while accepted.len() < k {
            let (prev_path, _) = accepted[accepted.len() - 1].clone();

            for spur_index in 0..prev_path.len() - 1 {
                let spur_node = &prev_path[spur_index];
                let root = &prev_path[..=spur_index];

                // Ban the next edge of every accepted path sharing this
                // root, and every root node except the spur itself.
                let mut banned: HashSet<(String, String)> = HashSet::new();
                for (path, _) in &accepted {
                    if path.len() > spur_index + 1 && path[..=spur_index] == *root {
                        banned.insert(edge_key(&path[spur_index], &path[spur_index + 1]));
                    }
                }
                for node in &root[..spur_index] {
                    for neighbor in view.neighbors(node) {
                        banned.insert(edge_key(node, neighbor));
                    }
                }

                let masked = view.without_edges(&banned);
                let Ok(Some((spur_path, _))) =
                    dijkstra::shortest_path(&masked, spur_node, dst, None, &cancel)
                else {
                    continue;
                };

                let mut candidate = root[..spur_index].to_vec();
                candidate.extend(spur_path);
                if seen.contains(&candidate) {
                    continue;
                }
                let cost = path_weight(&view, &candidate);
                seen.insert(candidate.clone());
                candidates.push((candidate, cost));
            }

            if candidates.is_empty() {
                break;
            }
            candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            accepted.push(candidates.remove(0));
        }

        accepted
            .into_iter()
            .take(k)
            .map(|(path, _)| Route::from_path(&view, path))
            .collect()
    }

    /// One backup route that shares no edge with the primary path, if any
    /// exists. Metrics come from the unmasked graph.
    pub fn backup_routes(&self, src: &str, dst: &str, primary: &[String]) -> Vec<Route> {
        let view = self.store.view();
        if primary.len() < 2 || !view.contains(src) || !view.contains(dst) {
            return Vec::new();
        }

        let banned: HashSet<(String, String)> = primary
            .windows(2)
            .map(|pair| edge_key(&pair[0], &pair[1]))
            .collect();
        let masked = view.without_edges(&banned);

        match dijkstra::shortest_path(&masked, src, dst, None, &CancelToken::new()) {
            Ok(Some((path, _))) => vec![Route::from_path(&view, path)],
            _ => Vec::new(),
        }
    }
}

fn path_weight(topology: &Topology, path: &[String]) -> f64 {
    path.windows(2)
        .map(|pair| topology.edge_weight(&pair[0], &pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::topology::test_support::*;
    use crate::protocol::{LinkMetrics, NodeType};

    fn weighted_link(src: &str, dst: &str, delay_ms: f64) -> crate::protocol::Link {
        link(
            src,
            dst,
            true,
            LinkMetrics {
                delay_ms,
                jitter_ms: 0.0,
                loss_rate: 0.0,
                bandwidth_mbps: 1000.0,
            },
        )
    }

    fn diamond_engine() -> RoutingEngine {
        let store = Arc::new(GraphStore::new());
        store
            .apply_snapshot(&snapshot(
                vec![
                    up_node("a", NodeType::Ship),
                    up_node("b", NodeType::Ship),
                    up_node("c", NodeType::Ship),
                    up_node("d", NodeType::Ship),
                ],
                vec![
                    weighted_link("a", "b", 1.0),
                    weighted_link("b", "d", 1.0),
                    weighted_link("a", "c", 5.0),
                    weighted_link("c", "d", 5.0),
                    weighted_link("a", "d", 20.0),
                ],
            ))
            .unwrap();
        RoutingEngine::new(store)
    }

    #[test]
    fn dispatch_agrees_across_exact_algorithms() {
        let engine = diamond_engine();
        let cancel = CancelToken::new();
        let dijkstra = engine
            .find_optimal_route("a", "d", AlgorithmKind::Dijkstra, None, &cancel)
            .unwrap()
            .unwrap();
        let astar = engine
            .find_optimal_route("a", "d", AlgorithmKind::Astar, None, &cancel)
            .unwrap()
            .unwrap();
        assert!((dijkstra.total_weight - astar.total_weight).abs() < 1e-9);
        assert_eq!(dijkstra.path, astar.path);
    }

    #[test]
    fn unknown_endpoint_is_no_route_not_an_error() {
        let engine = diamond_engine();
        let result = engine
            .find_optimal_route("a", "ghost", AlgorithmKind::Dijkstra, None, &CancelToken::new())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn k_shortest_is_sorted_and_distinct() {
        let engine = diamond_engine();
        let routes = engine.k_shortest_paths("a", "d", 3);
        assert_eq!(routes.len(), 3);
        for pair in routes.windows(2) {
            assert!(pair[0].total_weight <= pair[1].total_weight + 1e-12);
        }
        let paths: HashSet<Vec<String>> = routes.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths.len(), routes.len());
        assert_eq!(routes[0].path, vec!["a", "b", "d"]);
        assert_eq!(routes[1].path, vec!["a", "c", "d"]);
        assert_eq!(routes[2].path, vec!["a", "d"]);
    }

    #[test]
    fn k_shortest_stops_at_the_path_supply() {
        let engine = diamond_engine();
        let routes = engine.k_shortest_paths("a", "d", 10);
        // The diamond has exactly three simple a→d path families here.
        assert_eq!(routes.len(), 3);
    }

    #[test]
    fn backup_route_is_edge_disjoint_from_primary() {
        let engine = diamond_engine();
        let primary = vec!["a".to_string(), "b".to_string(), "d".to_string()];
        let backups = engine.backup_routes("a", "d", &primary);
        assert_eq!(backups.len(), 1);

        let primary_edges: HashSet<(String, String)> = primary
            .windows(2)
            .map(|p| edge_key(&p[0], &p[1]))
            .collect();
        for pair in backups[0].path.windows(2) {
            assert!(!primary_edges.contains(&edge_key(&pair[0], &pair[1])));
        }
    }

    #[test]
    fn backup_requires_a_real_primary() {
        let engine = diamond_engine();
        assert!(engine.backup_routes("a", "d", &["a".to_string()]).is_empty());
        assert!(engine
            .backup_routes("ghost", "d", &["ghost".to_string(), "d".to_string()])
            .is_empty());
    }

    #[test]
    fn backup_metrics_use_original_weights() {
        let engine = diamond_engine();
        let primary = vec!["a".to_string(), "b".to_string(), "d".to_string()];
        let backup = engine.backup_routes("a", "d", &primary).remove(0);
        let view = engine.store.view();
        let expected = path_weight(&view, &backup.path);
        assert!((backup.total_weight - expected).abs() < 1e-9);
    }
}
