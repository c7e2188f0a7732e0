//! Shared builders for integration tests.
#![allow(dead_code)] // each test binary uses a different subset

use sagroute::protocol::{GraphSnapshot, Link, LinkMetrics, Node, NodeMetrics, NodeType};

pub const TS: &str = "2026-03-01T12:00:00Z";

pub fn node(id: &str, kind: NodeType, status: &str, metrics: NodeMetrics) -> Node {
    Node {
        id: id.to_string(),
        kind,
        status: status.to_string(),
        metrics,
    }
}

pub fn up_node(id: &str, kind: NodeType) -> Node {
    node(id, kind, "UP", NodeMetrics::default())
}

pub fn link(src: &str, dst: &str, available: bool, metrics: LinkMetrics) -> Link {
    Link {
        src: src.to_string(),
        dst: dst.to_string(),
        available,
        metrics,
    }
}

pub fn metrics(delay_ms: f64, jitter_ms: f64, loss_rate: f64, bandwidth_mbps: f64) -> LinkMetrics {
    LinkMetrics {
        delay_ms,
        jitter_ms,
        loss_rate,
        bandwidth_mbps,
    }
}

pub fn snapshot(nodes: Vec<Node>, links: Vec<Link>) -> GraphSnapshot {
    GraphSnapshot {
        timestamp: TS.to_string(),
        nodes,
        links,
    }
}

/// Composite weight of a healthy link between idle UP nodes.
pub fn expected_clean_weight(delay_ms: f64, jitter_ms: f64, loss_rate: f64, bw: f64) -> f64 {
    delay_ms + 2.0 * jitter_ms + 1000.0 * loss_rate + 0.1 * (1000.0 / (bw + 1.0))
}
