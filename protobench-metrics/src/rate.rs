use std::time::Duration;

use crate::agg::per_sec;
use crate::window::{WindowError, observation_window};

/// Derived request rate plus the window it was computed over.
#[derive(Debug, Clone, PartialEq)]
pub struct Throughput {
    pub rps: f64,
    pub window: Duration,
    /// Set when the fallback window was used instead of the observed span.
    pub fallback: Option<WindowError>,
}

impl Throughput {
    fn zero() -> Self {
        Self {
            rps: 0.0,
            window: Duration::ZERO,
            fallback: None,
        }
    }
}

/// Iterations per second over the span covered by `timestamps`.
///
/// Collectors record discrete iteration counters rather than a rate, so the
/// rate is derived here. When the span cannot be determined (sparse,
/// identical or malformed timestamps) the sum is divided by
/// `fallback_window` instead.
pub fn throughput<S: AsRef<str>>(
    iterations: &[f64],
    timestamps: &[S],
    fallback_window: Duration,
) -> Throughput {
    if iterations.is_empty() {
        return Throughput::zero();
    }

    let total: f64 = iterations.iter().copied().filter(|v| v.is_finite()).sum();

    let (window, fallback) = match observation_window(timestamps) {
        Ok(window) => (window, None),
        Err(err) => (fallback_window, Some(err)),
    };

    if window.is_zero() {
        return Throughput {
            rps: 0.0,
            window,
            fallback,
        };
    }

    Throughput {
        rps: per_sec(total, window.as_secs_f64()).max(0.0),
        window,
        fallback,
    }
}

/// Shorthand for [`throughput`] when only the rate matters.
pub fn throughput_rps<S: AsRef<str>>(
    iterations: &[f64],
    timestamps: &[S],
    fallback_window: Duration,
) -> f64 {
    throughput(iterations, timestamps, fallback_window).rps
}

/// `100 * failed / total`, or 0 when no requests were recorded.
pub fn error_rate_percent(total_samples: &[f64], failed_samples: &[f64]) -> f64 {
    let total: f64 = total_samples
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .sum();
    if total <= 0.0 {
        return 0.0;
    }

    let failed: f64 = failed_samples
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .sum();

    (failed / total * 100.0).clamp(0.0, 100.0)
}

/// Single "higher is better" figure mixing throughput, tail latency and errors.
pub fn performance_score(throughput_rps: f64, latency_p95: f64, error_rate: f64) -> f64 {
    if latency_p95 > 0.0 || error_rate > 0.0 {
        throughput_rps * 100.0 / (latency_p95 + error_rate + 1.0)
    } else {
        throughput_rps * 100.0
    }
}
