//! Message shapes exchanged with the transport collaborator.
//!
//! The RPC layer itself lives outside this crate; these types define the
//! shapes the core consumes (snapshots, route and run requests) and produces
//! (responses and the algorithm step-event stream). Field order on the wire
//! is the transport's business, so everything here is plain serde data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::routing::Route;

/// Kind of node participating in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Satellite,
    GroundStation,
    Ship,
    Drone,
    MobileDevice,
    /// Catch-all: any type name this build does not recognize lands here
    /// instead of failing deserialization.
    #[serde(other)]
    Unknown,
}

impl Default for NodeType {
    fn default() -> Self {
        NodeType::Unknown
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Satellite => "satellite",
            NodeType::GroundStation => "ground_station",
            NodeType::Ship => "ship",
            NodeType::Drone => "drone",
            NodeType::MobileDevice => "mobile_device",
            NodeType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Per-node load and quality measurements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub cpu_load: f64,
    pub jitter_ms: f64,
    pub queue_len: u32,
    pub throughput_mbps: f64,
}

/// Per-link quality measurements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkMetrics {
    pub delay_ms: f64,
    pub jitter_ms: f64,
    pub loss_rate: f64,
    pub bandwidth_mbps: f64,
}

/// One node as described by a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NodeType,
    pub status: String,
    #[serde(default)]
    pub metrics: NodeMetrics,
}

/// One link as described by a snapshot. Links are consumed as ordered
/// pairs but the graph treats them as undirected with symmetric metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub src: String,
    pub dst: String,
    pub available: bool,
    #[serde(default)]
    pub metrics: LinkMetrics,
}

/// Complete description of the network at one instant. Each snapshot fully
/// replaces prior graph state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// RFC-3339 timestamp; a trailing `Z` means UTC.
    pub timestamp: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Outcome of a snapshot application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
}

/// Routing algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    Astar,
    Dijkstra,
    Greedy,
}

impl Default for AlgorithmKind {
    fn default() -> Self {
        AlgorithmKind::Astar
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmKind::Astar => "astar",
            AlgorithmKind::Dijkstra => "dijkstra",
            AlgorithmKind::Greedy => "greedy",
        };
        f.write_str(name)
    }
}

impl FromStr for AlgorithmKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "astar" => Ok(AlgorithmKind::Astar),
            "dijkstra" => Ok(AlgorithmKind::Dijkstra),
            "greedy" => Ok(AlgorithmKind::Greedy),
            other => Err(Error::InvalidArgument(format!(
                "unknown algorithm: {other}"
            ))),
        }
    }
}

/// A route query between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub source_node_id: String,
    pub destination_node_id: String,
    #[serde(default)]
    pub algorithm: AlgorithmKind,
}

/// Answer to a [`RouteRequest`]. `success = false` carries the reason in
/// `message` and leaves the numeric fields zeroed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteResponse {
    pub success: bool,
    pub path: Vec<String>,
    pub total_weight: f64,
    pub total_delay_ms: f64,
    pub stability_score: f64,
    pub hop_count: usize,
    pub message: String,
}

/// Request to run an algorithm while streaming its internal steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmRunRequest {
    pub algo: AlgorithmKind,
    pub src: String,
    pub dst: String,
}

/// What a single step event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// A node was dequeued for expansion.
    Expand,
    /// An A* relaxation produced an improvement.
    Consider,
    /// A Dijkstra relaxation produced an improvement.
    Relax,
    /// Greedy picked its next hop.
    Select,
    /// Terminal step, carrying the solution path when one was found.
    Complete,
}

/// One step of an algorithm run, in execution order. Fields are populated
/// per action; absent fields are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmStep {
    pub algo: AlgorithmKind,
    pub step: u64,
    pub action: StepAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

/// Event on an algorithm run stream: one `RunStart`, the ordered steps,
/// then exactly one `Complete` (absent only for cancelled runs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    RunStart {
        algo: AlgorithmKind,
        src: String,
        dst: String,
    },
    Step(AlgorithmStep),
    Complete {
        algo: AlgorithmKind,
        src: String,
        dst: String,
        result: Option<Route>,
    },
}
