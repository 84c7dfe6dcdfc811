//! Grouping of finalized runs by category fields.

use std::collections::BTreeMap;

use protobench_metrics::MeanAccumulator;
use serde::Serialize;

use crate::category::{CategoryKey, Protocol, TestType};
use crate::run::AnalyzedRun;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Protocol,
    TestType,
    Vus,
    Replicas,
}

/// A category key projected onto the grouping fields. Unused fields are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_type: Option<TestType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
}

impl GroupKey {
    pub fn project(key: &CategoryKey, fields: &[GroupField]) -> Self {
        let mut out = Self::default();
        for f in fields {
            match f {
                GroupField::Protocol => out.protocol = Some(key.protocol),
                GroupField::TestType => out.test_type = Some(key.test_type),
                GroupField::Vus => out.vus = Some(key.vus),
                GroupField::Replicas => out.replicas = Some(key.replicas),
            }
        }
        out
    }
}

/// The per-run figures that take part in aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatValues {
    pub latency_p50: f64,
    pub latency_p95: f64,
    pub latency_p99: f64,
    pub latency_mean: f64,
    pub latency_min: f64,
    pub latency_max: f64,
    pub throughput_rps: f64,
    pub error_rate: f64,
}

/// Anything that can be grouped: freshly analyzed runs or runs re-read from
/// an exported report.
pub trait AggregateInput {
    fn category(&self) -> CategoryKey;
    fn stat_values(&self) -> StatValues;
    fn is_defaulted(&self) -> bool;
}

impl AggregateInput for AnalyzedRun {
    fn category(&self) -> CategoryKey {
        self.metadata.key
    }

    fn stat_values(&self) -> StatValues {
        // Runs without latency samples count as zero latency.
        let l = self.stats.latency.unwrap_or_default();
        StatValues {
            latency_p50: l.p50,
            latency_p95: l.p95,
            latency_p99: l.p99,
            latency_mean: l.mean,
            latency_min: l.min,
            latency_max: l.max,
            throughput_rps: self.stats.throughput_rps,
            error_rate: self.stats.error_rate_percent,
        }
    }

    fn is_defaulted(&self) -> bool {
        self.metadata.is_defaulted()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct StatMeanAcc {
    latency_p50: MeanAccumulator,
    latency_p95: MeanAccumulator,
    latency_p99: MeanAccumulator,
    latency_mean: MeanAccumulator,
    latency_min: MeanAccumulator,
    latency_max: MeanAccumulator,
    throughput_rps: MeanAccumulator,
    error_rate: MeanAccumulator,
}

impl StatMeanAcc {
    fn push(&mut self, v: &StatValues) {
        self.latency_p50.push(v.latency_p50);
        self.latency_p95.push(v.latency_p95);
        self.latency_p99.push(v.latency_p99);
        self.latency_mean.push(v.latency_mean);
        self.latency_min.push(v.latency_min);
        self.latency_max.push(v.latency_max);
        self.throughput_rps.push(v.throughput_rps);
        self.error_rate.push(v.error_rate);
    }

    fn means(&self) -> StatValues {
        let m = |a: &MeanAccumulator| a.mean().unwrap_or(0.0);
        StatValues {
            latency_p50: m(&self.latency_p50),
            latency_p95: m(&self.latency_p95),
            latency_p99: m(&self.latency_p99),
            latency_mean: m(&self.latency_mean),
            latency_min: m(&self.latency_min),
            latency_max: m(&self.latency_max),
            throughput_rps: m(&self.throughput_rps),
            error_rate: m(&self.error_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    /// Number of runs in the group. Never zero.
    pub runs: usize,
    pub means: StatValues,
}

/// Groups `items` by the projection of their category onto `fields`.
///
/// Items rejected by `filter` are ignored. Rows come out ordered by key.
pub fn aggregate<T, F>(items: &[T], fields: &[GroupField], filter: F) -> Vec<AggregateRow>
where
    T: AggregateInput,
    F: Fn(&CategoryKey) -> bool,
{
    let mut groups: BTreeMap<GroupKey, (usize, StatMeanAcc)> = BTreeMap::new();

    for item in items {
        let category = item.category();
        if !filter(&category) {
            continue;
        }
        let (runs, acc) = groups
            .entry(GroupKey::project(&category, fields))
            .or_default();
        *runs += 1;
        acc.push(&item.stat_values());
    }

    groups
        .into_iter()
        .map(|(key, (runs, acc))| AggregateRow {
            key,
            runs,
            means: acc.means(),
        })
        .collect()
}

/// [`aggregate`] without a filter.
pub fn aggregate_all<T: AggregateInput>(items: &[T], fields: &[GroupField]) -> Vec<AggregateRow> {
    aggregate(items, fields, |_| true)
}
