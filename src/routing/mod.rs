//! Routing algorithms and the engine that dispatches them.
//!
//! All three algorithms share the [`Route`] result contract and emit
//! ordered step events through [`step::StepSink`] for live visualization.

pub mod astar;
pub mod dijkstra;
pub mod engine;
pub mod greedy;
pub mod route;
pub mod step;

pub use engine::RoutingEngine;
pub use route::Route;
pub use step::{CancelToken, ChannelSink, StepSink, StepTracer};
