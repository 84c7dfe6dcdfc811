use serde::{Deserialize, Serialize};

/// Latency summary over a set of request durations, in milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Linear-interpolation percentile over an ascending slice.
///
/// The rank is `p / 100 * (n - 1)`; the result interpolates between the two
/// closest ranked samples (the usual `linear` method).
///
/// Returns `None` for an empty slice. `p` is clamped to `[0, 100]`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) };

    let rank = p / 100.0 * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    let lo_v = sorted[lo.min(last)];
    let hi_v = sorted[hi.min(last)];
    if lo == hi {
        return Some(lo_v);
    }

    Some(lo_v + (hi_v - lo_v) * (rank - lo as f64))
}

/// Same as [`percentile_sorted`] but accepts samples in any order.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let sorted = sorted_finite(values);
    percentile_sorted(&sorted, p)
}

/// Computes `{p50, p95, p99, mean, min, max}`.
///
/// `None` means "no latency data": either the input was empty or every
/// sample was non-finite.
pub fn latency_stats(values: &[f64]) -> Option<LatencyStats> {
    let sorted = sorted_finite(values);
    let (&min, &max) = (sorted.first()?, sorted.last()?);

    let sum: f64 = sorted.iter().sum();
    let mean = sum / sorted.len() as f64;

    Some(LatencyStats {
        p50: percentile_sorted(&sorted, 50.0)?,
        p95: percentile_sorted(&sorted, 95.0)?,
        p99: percentile_sorted(&sorted, 99.0)?,
        mean,
        min,
        max,
    })
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}
