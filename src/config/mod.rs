//! Runtime configuration for the advisor.
//!
//! All knobs are environment variables so the service can be dropped into a
//! container without a config file. Invalid values fail startup instead of
//! being silently replaced with defaults.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Facade listen address handed to the transport collaborator.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50052";
/// Bounded history window `W` per (entity, metric) series.
pub const DEFAULT_HISTORY_WINDOW: usize = 50;
/// Exponential moving average smoothing factor α.
pub const DEFAULT_EMA_SMOOTHING: f64 = 0.3;

const ENV_LISTEN: &str = "HEURISTIC_LISTEN";
const ENV_HISTORY_WINDOW: &str = "HISTORY_WINDOW";
const ENV_EMA_SMOOTHING: &str = "EMA_SMOOTHING";

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the transport collaborator should bind.
    pub listen_addr: String,
    /// Maximum samples retained per (entity, metric) series.
    pub history_window: usize,
    /// EMA smoothing factor in (0, 1].
    pub ema_smoothing: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            ema_smoothing: DEFAULT_EMA_SMOOTHING,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            listen_addr: env::var(ENV_LISTEN).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
            history_window: parse_window(env::var(ENV_HISTORY_WINDOW).ok())?,
            ema_smoothing: parse_smoothing(env::var(ENV_EMA_SMOOTHING).ok())?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that the env parsers cannot express alone.
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(Error::Config(format!("{ENV_LISTEN} must not be empty")));
        }
        if self.history_window == 0 {
            return Err(Error::Config(format!(
                "{ENV_HISTORY_WINDOW} must be at least 1"
            )));
        }
        if !(self.ema_smoothing > 0.0 && self.ema_smoothing <= 1.0) {
            return Err(Error::Config(format!(
                "{ENV_EMA_SMOOTHING} must be in (0, 1], got {}",
                self.ema_smoothing
            )));
        }
        Ok(())
    }
}

fn parse_window(raw: Option<String>) -> Result<usize> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| {
            Error::Config(format!(
                "{ENV_HISTORY_WINDOW} must be a positive integer, got {value:?}"
            ))
        }),
        None => Ok(DEFAULT_HISTORY_WINDOW),
    }
}

fn parse_smoothing(raw: Option<String>) -> Result<f64> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| {
            Error::Config(format!(
                "{ENV_EMA_SMOOTHING} must be a real number, got {value:?}"
            ))
        }),
        None => Ok(DEFAULT_EMA_SMOOTHING),
    }
}
