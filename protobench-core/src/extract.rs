use ahash::AHashMap;

use crate::event::{Event, Sample};

/// Complete point samples of `metric`, in encounter order.
///
/// Matching is exact on the metric name. Duplicates are kept.
pub fn extract<'a, I>(events: I, metric: &str) -> Vec<Sample<'a>>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .filter_map(Event::as_point)
        .filter(|(name, _)| *name == metric)
        .map(|(_, sample)| sample)
        .collect()
}

/// Per-metric samples for a fixed set of metric names, built in one pass.
#[derive(Debug, Default)]
pub struct MetricIndex<'a> {
    series: AHashMap<&'a str, Vec<Sample<'a>>>,
}

impl<'a> MetricIndex<'a> {
    pub fn build<I>(events: I, metrics: &[&str]) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut series: AHashMap<&'a str, Vec<Sample<'a>>> = AHashMap::new();

        for (name, sample) in events.into_iter().filter_map(Event::as_point) {
            if metrics.iter().any(|m| *m == name) {
                series.entry(name).or_default().push(sample);
            }
        }

        Self { series }
    }

    pub fn samples(&self, metric: &str) -> &[Sample<'a>] {
        self.series
            .get(metric)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn values(&self, metric: &str) -> Vec<f64> {
        self.samples(metric).iter().map(|s| s.value).collect()
    }

    pub fn timestamps(&self, metric: &str) -> Vec<&'a str> {
        self.samples(metric).iter().map(|s| s.timestamp).collect()
    }

    pub fn sum(&self, metric: &str) -> f64 {
        self.samples(metric)
            .iter()
            .map(|s| s.value)
            .filter(|v| v.is_finite())
            .sum()
    }
}
