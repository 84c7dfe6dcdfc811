use std::time::Duration;

use chrono::{DateTime, FixedOffset};

/// Window assumed when the observation span cannot be derived from timestamps.
pub const DEFAULT_FALLBACK_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("fewer than two distinct timestamps")]
    TooFewTimestamps,

    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),

    #[error("observation window is empty")]
    EmptyWindow,
}

/// Parses an RFC 3339 / ISO-8601 instant (`2024-01-01T00:00:00Z`,
/// `2024-01-01T00:00:00.123456-03:00`).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, WindowError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|_| WindowError::InvalidTimestamp(raw.to_string()))
}

/// Elapsed time between the earliest and the latest timestamp.
///
/// Timestamps may arrive in any order. Fails if fewer than two distinct raw
/// values are present, if any value does not parse, or if the span is zero.
pub fn observation_window<S: AsRef<str>>(timestamps: &[S]) -> Result<Duration, WindowError> {
    let mut distinct: Vec<&str> = timestamps.iter().map(AsRef::as_ref).collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(WindowError::TooFewTimestamps);
    }

    let mut min: Option<DateTime<FixedOffset>> = None;
    let mut max: Option<DateTime<FixedOffset>> = None;
    for raw in distinct {
        let ts = parse_timestamp(raw)?;
        min = Some(min.map_or(ts, |m| m.min(ts)));
        max = Some(max.map_or(ts, |m| m.max(ts)));
    }

    let (Some(min), Some(max)) = (min, max) else {
        return Err(WindowError::TooFewTimestamps);
    };

    match (max - min).to_std() {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(WindowError::EmptyWindow),
    }
}
