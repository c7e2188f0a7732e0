//! Rolling stability analysis: bounded metric history, series statistics
//! and the analyzer that aggregates them per entity and network-wide.

pub mod analyzer;
pub mod history;
pub mod stability;

pub use analyzer::StabilityAnalyzer;
pub use history::{EntityKind, MetricSample, MetricsHistory};
pub use stability::{
    NetworkStability, SideStability, StabilityMetrics, DEFAULT_ANOMALY_THRESHOLD,
};
