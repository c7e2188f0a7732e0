//! Bounded per-(entity, metric) sample history with exponential smoothing.
//!
//! Entities are discovered on first appearance and never removed; a
//! vanished entity simply stops receiving samples and its window decays
//! into irrelevance. Each series is guarded by its own map shard, so
//! concurrent snapshot ingestion and analyzer reads do not contend on a
//! single lock.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Which side of the graph a series belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Node,
    Link,
}

/// One recorded observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey {
    kind: EntityKind,
    entity: String,
    metric: String,
}

impl SeriesKey {
    fn new(kind: EntityKind, entity: &str, metric: &str) -> Self {
        Self {
            kind,
            entity: entity.to_string(),
            metric: metric.to_string(),
        }
    }
}

#[derive(Debug)]
struct MetricSeries {
    samples: VecDeque<MetricSample>,
    ema: f64,
}

/// Concurrent store of all metric series.
#[derive(Debug)]
pub struct MetricsHistory {
    series: DashMap<SeriesKey, MetricSeries>,
    window: usize,
    smoothing: f64,
}

impl MetricsHistory {
    /// `window` caps every series; `smoothing` is the EMA α.
    pub fn new(window: usize, smoothing: f64) -> Self {
        Self {
            series: DashMap::new(),
            window: window.max(1),
            smoothing,
        }
    }

    /// Append one sample, evicting FIFO past the window, and fold it into
    /// the EMA (which is seeded with the first sample).
    pub fn record(
        &self,
        kind: EntityKind,
        entity: &str,
        metric: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) {
        let key = SeriesKey::new(kind, entity, metric);
        let mut series = self.series.entry(key).or_insert_with(|| MetricSeries {
            samples: VecDeque::with_capacity(self.window),
            ema: value,
        });
        if !series.samples.is_empty() {
            series.ema = self.smoothing * value + (1.0 - self.smoothing) * series.ema;
        }
        if series.samples.len() == self.window {
            series.samples.pop_front();
        }
        series.samples.push_back(MetricSample { timestamp, value });
    }

    /// Copy of the series, oldest first. Empty for unknown series.
    pub fn history(&self, kind: EntityKind, entity: &str, metric: &str) -> Vec<MetricSample> {
        self.series
            .get(&SeriesKey::new(kind, entity, metric))
            .map(|s| s.samples.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Current EMA, or 0 when the series has never seen a sample.
    pub fn ema(&self, kind: EntityKind, entity: &str, metric: &str) -> f64 {
        self.series
            .get(&SeriesKey::new(kind, entity, metric))
            .map(|s| s.ema)
            .unwrap_or(0.0)
    }

    /// Statistics need at least two samples to mean anything.
    pub fn has_enough_data(&self, kind: EntityKind, entity: &str, metric: &str) -> bool {
        self.series
            .get(&SeriesKey::new(kind, entity, metric))
            .map(|s| s.samples.len() >= 2)
            .unwrap_or(false)
    }

    /// All entity ids ever seen for a kind, sorted.
    pub fn entity_ids(&self, kind: EntityKind) -> Vec<String> {
        let ids: BTreeSet<String> = self
            .series
            .iter()
            .filter(|entry| entry.key().kind == kind)
            .map(|entry| entry.key().entity.clone())
            .collect();
        ids.into_iter().collect()
    }

    /// Metric names recorded for one entity, sorted.
    pub fn metric_names(&self, kind: EntityKind, entity: &str) -> Vec<String> {
        let names: BTreeSet<String> = self
            .series
            .iter()
            .filter(|entry| entry.key().kind == kind && entry.key().entity == entity)
            .map(|entry| entry.key().metric.clone())
            .collect();
        names.into_iter().collect()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
