//! Small statistical helpers shared by the profiler and the detectors.
//!
//! `percentile` uses linear interpolation between closest ranks so that
//! scoring thresholds are reproducible across runs.

use chrono::{DateTime, Utc};

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0), matching the reference
/// implementation's use of `numpy.std`.
pub fn population_stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// 1 - min(stddev/mean, 1), clamped at 0. Used for both temporal
/// regularity and amount consistency — the two share a formula.
fn consistency_from(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    if m == 0.0 {
        return 0.0;
    }
    let sd = population_stddev(values);
    (1.0 - (sd / m).min(1.0)).max(0.0)
}

/// Regularity of a timestamp sequence: sort, take inter-arrival
/// intervals in days, then apply the consistency formula. 0 for fewer
/// than two timestamps.
pub fn regularity_score(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.len() < 2 {
        return 0.0;
    }
    let mut sorted = timestamps.to_vec();
    sorted.sort();
    let intervals: Vec<f64> = sorted
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds() as f64 / 86_400.0)
        .collect();
    consistency_from(&intervals)
}

/// Amount consistency: same formula applied directly to amounts.
pub fn amount_consistency_score(amounts: &[f64]) -> f64 {
    consistency_from(amounts)
}

/// Percentile via linear interpolation between closest ranks.
/// `values` need not be pre-sorted.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
