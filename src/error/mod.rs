//! Error types and handling for the routing advisor.
//!
//! Every fallible operation in the crate returns [`Result`]. The facade is
//! the only layer that converts these kinds into transport-level responses;
//! inner components propagate them with `?`.

use thiserror::Error;

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Advisor error kinds surfaced at component boundaries
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied something the service cannot interpret, such as
    /// an unknown algorithm name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A snapshot could not be applied. Graph and history state are
    /// unchanged when this is returned.
    #[error("snapshot rejected: {0}")]
    InvalidSnapshot(String),

    /// A referenced entity is not part of the current graph.
    #[error("not found: {0}")]
    NotFound(String),

    /// The search completed without reaching the destination.
    #[error("no route from {src} to {dst}")]
    NoPath { src: String, dst: String },

    /// The request's cancellation signal fired mid-run.
    #[error("run cancelled")]
    Cancelled,

    /// Startup configuration could not be parsed or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected failure inside an algorithm or component.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that leave state untouched and may succeed on retry
    /// with corrected input.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::InvalidSnapshot(_))
    }
}
