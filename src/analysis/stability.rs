//! Statistics over metric time series.
//!
//! A series is summarized by its dispersion (coefficient of variation) and
//! drift (least-squares trend over the sample index), blended into a [0, 1]
//! stability score. Entity and network aggregates weight the per-metric
//! scores by operational importance.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::analysis::history::{EntityKind, MetricSample};

/// Score blend between dispersion and drift.
const CV_SHARE: f64 = 0.6;
const TREND_SHARE: f64 = 0.4;
/// Network blend between the node side and the link side.
const NODE_SHARE: f64 = 0.4;
const LINK_SHARE: f64 = 0.6;
/// Default z-score cutoff for anomaly detection.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 3.0;

/// Canonical node metrics and their aggregate weights.
pub static NODE_METRIC_WEIGHTS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("cpu_load", 0.30),
        ("jitter_ms", 0.30),
        ("queue_len", 0.20),
        ("throughput_mbps", 0.20),
    ])
});

/// Canonical link metrics and their aggregate weights.
pub static LINK_METRIC_WEIGHTS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("delay_ms", 0.35),
        ("jitter_ms", 0.35),
        ("loss_rate", 0.20),
        ("bandwidth_mbps", 0.10),
    ])
});

/// Summary statistics for one metric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityMetrics {
    pub mean: f64,
    /// Sample variance (ddof = 1); zero below two samples.
    pub variance: f64,
    pub std_deviation: f64,
    /// `std / mean`; infinite when the mean is zero.
    pub coefficient_of_variation: f64,
    /// Least-squares slope over the sample index; zero below three samples.
    pub trend: f64,
    pub stability_score: f64,
}

/// Summarize a series of raw values.
pub fn series_metrics(values: &[f64]) -> StabilityMetrics {
    let n = values.len();
    let mean = if n > 0 {
        values.iter().sum::<f64>() / n as f64
    } else {
        0.0
    };
    let variance = if n > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };
    let std_deviation = variance.sqrt();
    let coefficient_of_variation = if mean != 0.0 {
        std_deviation / mean
    } else {
        f64::INFINITY
    };
    let trend = if n >= 3 {
        linear_slope(values)
    } else {
        0.0
    };

    StabilityMetrics {
        mean,
        variance,
        std_deviation,
        coefficient_of_variation,
        trend,
        stability_score: stability_score(coefficient_of_variation, trend.abs(), mean),
    }
}

/// Slope of the least-squares line over `x = 0..n`.
fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let sum_x = (n - 1.0) * n / 2.0;
    let sum_x2 = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values
        .iter()
        .enumerate()
        .map(|(i, v)| i as f64 * v)
        .sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Blend dispersion and relative drift into a clamped [0, 1] score.
pub fn stability_score(cv: f64, abs_trend: f64, mean: f64) -> f64 {
    let cv_score = (1.0 - cv / 2.0).max(0.0);
    let relative_trend = abs_trend / (mean + 0.001);
    let trend_score = (1.0 - relative_trend * 10.0).max(0.0);
    (CV_SHARE * cv_score + TREND_SHARE * trend_score).clamp(0.0, 1.0)
}

/// Samples whose z-score against the series mean exceeds `threshold`.
pub fn detect_anomalies(
    samples: &[MetricSample],
    metrics: &StabilityMetrics,
    threshold: f64,
) -> Vec<MetricSample> {
    samples
        .iter()
        .filter(|sample| {
            let z = (sample.value - metrics.mean).abs() / (metrics.std_deviation + 0.001);
            z > threshold
        })
        .copied()
        .collect()
}

/// Combine per-metric scores for one entity. When the measured metric set
/// is exactly the canonical one the fixed weights apply, paired by name;
/// any other set falls back to the arithmetic mean.
pub fn weighted_entity_score(scores: &HashMap<String, f64>, kind: EntityKind) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let weights: &HashMap<&str, f64> = match kind {
        EntityKind::Node => &NODE_METRIC_WEIGHTS,
        EntityKind::Link => &LINK_METRIC_WEIGHTS,
    };

    let canonical = scores.len() == weights.len()
        && scores.keys().all(|name| weights.contains_key(name.as_str()));
    if canonical {
        scores
            .iter()
            .map(|(name, score)| score * weights[name.as_str()])
            .sum()
    } else {
        scores.values().sum::<f64>() / scores.len() as f64
    }
}

/// Aggregate stability of one side of the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SideStability {
    pub average: f64,
    pub minimum: f64,
    /// Population variance of the per-entity scores.
    pub variance: f64,
}

/// Whole-network stability rollup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkStability {
    pub nodes: Option<SideStability>,
    pub links: Option<SideStability>,
    pub overall: f64,
}

fn side_stability(scores: &[f64]) -> Option<SideStability> {
    if scores.is_empty() {
        return None;
    }
    let n = scores.len() as f64;
    let average = scores.iter().sum::<f64>() / n;
    let minimum = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let variance = scores.iter().map(|s| (s - average).powi(2)).sum::<f64>() / n;
    Some(SideStability {
        average,
        minimum,
        variance,
    })
}

/// Blend node-side and link-side stability, favoring links.
pub fn network_stability(node_scores: &[f64], link_scores: &[f64]) -> NetworkStability {
    let nodes = side_stability(node_scores);
    let links = side_stability(link_scores);
    let overall = match (nodes, links) {
        (Some(n), Some(l)) => NODE_SHARE * n.average + LINK_SHARE * l.average,
        (None, Some(l)) => l.average,
        (Some(n), None) => n.average,
        (None, None) => 0.0,
    };
    NetworkStability {
        nodes,
        links,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn samples(values: &[f64]) -> Vec<MetricSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| MetricSample {
                timestamp: DateTime::from_timestamp(1_760_000_000 + i as i64, 0).unwrap(),
                value,
            })
            .collect()
    }

    #[test]
    fn constant_series_is_perfectly_stable() {
        let metrics = series_metrics(&[5.0, 5.0, 5.0, 5.0]);
        assert_eq!(metrics.mean, 5.0);
        assert_eq!(metrics.variance, 0.0);
        assert_eq!(metrics.coefficient_of_variation, 0.0);
        assert_eq!(metrics.trend, 0.0);
        assert_eq!(metrics.stability_score, 1.0);
    }

    #[test]
    fn sample_variance_uses_ddof_one() {
        let metrics = series_metrics(&[1.0, 3.0]);
        assert_eq!(metrics.mean, 2.0);
        // ((1-2)^2 + (3-2)^2) / (2 - 1)
        assert_eq!(metrics.variance, 2.0);
    }

    #[test]
    fn zero_mean_makes_cv_infinite_and_score_bounded() {
        let metrics = series_metrics(&[-1.0, 1.0, -1.0, 1.0]);
        assert!(metrics.coefficient_of_variation.is_infinite());
        assert!((0.0..=1.0).contains(&metrics.stability_score));
    }

    #[test]
    fn linear_series_reports_its_slope() {
        let metrics = series_metrics(&[0.0, 2.0, 4.0, 6.0]);
        assert!((metrics.trend - 2.0).abs() < 1e-9);
        let flat = series_metrics(&[7.0, 7.0]);
        assert_eq!(flat.trend, 0.0); // below three samples
    }

    #[test]
    fn anomalies_are_z_score_outliers() {
        // A single spike inflates the std enough that it sits around 2.3
        // sigmas; it shows up at a threshold of 2 but not at the default 3.
        let values = [10.0, 10.1, 9.9, 10.0, 10.05, 9.95, 50.0];
        let metrics = series_metrics(&values);
        let strict = detect_anomalies(&samples(&values), &metrics, DEFAULT_ANOMALY_THRESHOLD);
        assert!(strict.is_empty());
        let relaxed = detect_anomalies(&samples(&values), &metrics, 2.0);
        assert_eq!(relaxed.len(), 1);
        assert_eq!(relaxed[0].value, 50.0);
    }

    #[test]
    fn steady_series_has_no_anomalies() {
        let values = [1.0, 1.01, 0.99, 1.0, 1.02];
        let metrics = series_metrics(&values);
        assert!(detect_anomalies(&samples(&values), &metrics, DEFAULT_ANOMALY_THRESHOLD)
            .is_empty());
    }

    #[test]
    fn canonical_node_metrics_use_fixed_weights() {
        let scores = HashMap::from([
            ("cpu_load".to_string(), 1.0),
            ("jitter_ms".to_string(), 0.5),
            ("queue_len".to_string(), 0.0),
            ("throughput_mbps".to_string(), 1.0),
        ]);
        let combined = weighted_entity_score(&scores, EntityKind::Node);
        let expected = 1.0 * 0.30 + 0.5 * 0.30 + 0.0 * 0.20 + 1.0 * 0.20;
        assert!((combined - expected).abs() < 1e-12);
    }

    #[test]
    fn partial_metric_sets_fall_back_to_the_mean() {
        let scores = HashMap::from([
            ("cpu_load".to_string(), 0.4),
            ("jitter_ms".to_string(), 0.8),
        ]);
        let combined = weighted_entity_score(&scores, EntityKind::Node);
        assert!((combined - 0.6).abs() < 1e-12);
    }

    #[test]
    fn network_blend_prefers_links() {
        let rollup = network_stability(&[1.0, 0.5], &[0.8, 0.6]);
        let nodes = rollup.nodes.unwrap();
        let links = rollup.links.unwrap();
        assert!((nodes.average - 0.75).abs() < 1e-12);
        assert!((links.average - 0.7).abs() < 1e-12);
        assert!((rollup.overall - (0.4 * 0.75 + 0.6 * 0.7)).abs() < 1e-12);
        assert_eq!(nodes.minimum, 0.5);
    }

    #[test]
    fn one_sided_networks_use_that_side() {
        assert!((network_stability(&[], &[0.9]).overall - 0.9).abs() < 1e-12);
        assert!((network_stability(&[0.4], &[]).overall - 0.4).abs() < 1e-12);
        assert_eq!(network_stability(&[], &[]).overall, 0.0);
    }
}
