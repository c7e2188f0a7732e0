//! sagroute - routing and stability advisor for heterogeneous mesh
//! networks of satellites, ground stations, ships, drones and mobile
//! devices.
//!
//! The crate consumes periodic topology snapshots, answers routing queries
//! under multiple algorithms while streaming each algorithm's internal
//! search steps, and maintains a rolling stability analysis of per-node
//! and per-link metrics. Transport, wire schema and process supervision
//! belong to external collaborators; [`service::AdvisorService`] is the
//! boundary they talk to.

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod protocol;
pub mod routing;
pub mod service;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use routing::{CancelToken, Route};
pub use service::AdvisorService;
