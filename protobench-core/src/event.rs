use serde_json::Value;

/// Record discriminator of a k6 `--out json` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString)]
pub enum EventKind {
    /// A discrete sampled value.
    Point,
    /// A metric declaration (name, type, thresholds); carries no sample.
    Metric,
    /// Anything else, including records without a `type`.
    #[strum(disabled)]
    Other,
}

/// One decoded record.
///
/// Every decodable line becomes an `Event`; records that do not look like a
/// k6 sample keep `None` fields and are ignored by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub metric: Option<String>,
    /// Raw timestamp as recorded (RFC 3339). Parsed lazily by consumers.
    pub timestamp: Option<String>,
    pub value: Option<f64>,
}

/// Borrowed `(timestamp, value)` pair of a point event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a> {
    pub timestamp: &'a str,
    pub value: f64,
}

impl Event {
    /// Builds a point event. Mostly useful in tests and fixtures.
    pub fn point(metric: impl Into<String>, timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            kind: EventKind::Point,
            metric: Some(metric.into()),
            timestamp: Some(timestamp.into()),
            value: Some(value),
        }
    }

    /// Interprets a decoded JSON record.
    ///
    /// Expected shape: `{"type": "Point", "metric": "...", "data": {"time": "...", "value": 1.0}}`.
    /// Other shapes are accepted and simply produce empty fields.
    pub fn from_value(record: &Value) -> Self {
        let kind = record
            .get("type")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(EventKind::Other);

        let metric = record
            .get("metric")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let data = record.get("data");
        let timestamp = data
            .and_then(|d| d.get("time"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        let value = data.and_then(|d| d.get("value")).and_then(Value::as_f64);

        Self {
            kind,
            metric,
            timestamp,
            value,
        }
    }

    /// Returns the metric name and sample if this is a complete point event.
    pub fn as_point(&self) -> Option<(&str, Sample<'_>)> {
        if self.kind != EventKind::Point {
            return None;
        }
        let metric = self.metric.as_deref()?;
        let timestamp = self.timestamp.as_deref()?;
        let value = self.value?;
        Some((metric, Sample { timestamp, value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_k6_point() {
        let v = json!({
            "type": "Point",
            "metric": "http_req_duration",
            "data": {"time": "2024-01-01T00:00:00Z", "value": 12.5, "tags": {"status": "200"}}
        });

        let e = Event::from_value(&v);
        assert_eq!(e.kind, EventKind::Point);
        assert_eq!(
            e.as_point(),
            Some((
                "http_req_duration",
                Sample {
                    timestamp: "2024-01-01T00:00:00Z",
                    value: 12.5
                }
            ))
        );
    }

    #[test]
    fn metric_declarations_are_not_points() {
        let v = json!({
            "type": "Metric",
            "metric": "http_req_duration",
            "data": {"name": "http_req_duration", "type": "trend", "contains": "time"}
        });

        let e = Event::from_value(&v);
        assert_eq!(e.kind, EventKind::Metric);
        assert_eq!(e.as_point(), None);
    }

    #[test]
    fn odd_shapes_become_other_events() {
        for v in [
            json!(42),
            json!(["Point"]),
            json!({"type": 7, "metric": "x"}),
            json!({"type": "point", "metric": "x", "data": {"time": "t", "value": 1}}),
        ] {
            let e = Event::from_value(&v);
            assert_eq!(e.kind, EventKind::Other, "{v}");
            assert_eq!(e.as_point(), None, "{v}");
        }
    }

    #[test]
    fn point_without_value_or_time_is_incomplete() {
        let no_value = json!({"type": "Point", "metric": "iterations", "data": {"time": "t"}});
        let no_time = json!({"type": "Point", "metric": "iterations", "data": {"value": 1}});
        let no_data = json!({"type": "Point", "metric": "iterations"});

        for v in [no_value, no_time, no_data] {
            let e = Event::from_value(&v);
            assert_eq!(e.kind, EventKind::Point);
            assert_eq!(e.as_point(), None, "{v}");
        }
    }
}
