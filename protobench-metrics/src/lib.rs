pub mod agg;
pub mod latency;
pub mod rate;
pub mod window;

pub use agg::{MeanAccumulator, per_sec};
pub use latency::{LatencyStats, latency_stats, percentile, percentile_sorted};
pub use rate::{Throughput, error_rate_percent, performance_score, throughput, throughput_rps};
pub use window::{DEFAULT_FALLBACK_WINDOW, WindowError, observation_window, parse_timestamp};
