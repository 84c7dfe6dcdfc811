//! Comparison tables built from grouped runs.

use serde::Serialize;

use crate::aggregate::{AggregateInput, AggregateRow, GroupField, GroupKey, StatValues, aggregate};
use crate::category::{CategoryKey, Protocol, TestType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Column {
    LatencyMean,
    LatencyP50,
    LatencyP95,
    LatencyP99,
    ThroughputRps,
    ErrorRate,
    SuccessRate,
    Efficiency,
    /// Throughput change over the same protocol's 1-replica row, in percent.
    ThroughputGain,
}

impl Column {
    pub fn label(self) -> &'static str {
        match self {
            Column::LatencyMean => "Mean Latency (ms)",
            Column::LatencyP50 => "P50 Latency (ms)",
            Column::LatencyP95 => "P95 Latency (ms)",
            Column::LatencyP99 => "P99 Latency (ms)",
            Column::ThroughputRps => "Throughput (RPS)",
            Column::ErrorRate => "Error Rate (%)",
            Column::SuccessRate => "Success Rate (%)",
            Column::Efficiency => "Efficiency (RPS/s latency)",
            Column::ThroughputGain => "Gain vs 1 Replica (%)",
        }
    }

    /// Whether a larger value is the better outcome.
    pub fn higher_is_better(self) -> bool {
        match self {
            Column::LatencyMean
            | Column::LatencyP50
            | Column::LatencyP95
            | Column::LatencyP99
            | Column::ErrorRate => false,
            Column::ThroughputRps
            | Column::SuccessRate
            | Column::Efficiency
            | Column::ThroughputGain => true,
        }
    }

    /// Cell value for a row. `baseline` is the row's 1-replica counterpart,
    /// used by [`Column::ThroughputGain`] only; the gain is 0 without one.
    pub fn value(self, m: &StatValues, baseline: Option<&StatValues>) -> f64 {
        match self {
            Column::LatencyMean => m.latency_mean,
            Column::LatencyP50 => m.latency_p50,
            Column::LatencyP95 => m.latency_p95,
            Column::LatencyP99 => m.latency_p99,
            Column::ThroughputRps => m.throughput_rps,
            Column::ErrorRate => m.error_rate,
            Column::SuccessRate => 100.0 - m.error_rate,
            Column::Efficiency => {
                if m.latency_mean > 0.0 {
                    m.throughput_rps / (m.latency_mean / 1000.0)
                } else {
                    0.0
                }
            }
            Column::ThroughputGain => match baseline {
                Some(b) if b.throughput_rps > 0.0 => {
                    (m.throughput_rps - b.throughput_rps) / b.throughput_rps * 100.0
                }
                _ => 0.0,
            },
        }
    }
}

/// Static description of one comparison table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub group_by: &'static [GroupField],
    pub columns: &'static [Column],
    /// Restricts the table to one test type.
    pub only: Option<TestType>,
}

impl TableSpec {
    fn accepts(&self, key: &CategoryKey) -> bool {
        self.only.is_none_or(|t| key.test_type == t)
    }
}

pub const GENERAL: TableSpec = TableSpec {
    name: "general",
    title: "General Comparison",
    group_by: &[GroupField::Protocol],
    columns: &[
        Column::LatencyMean,
        Column::LatencyP95,
        Column::LatencyP99,
        Column::ThroughputRps,
        Column::ErrorRate,
    ],
    only: None,
};

pub const LOAD_COMPARISON: TableSpec = TableSpec {
    name: "load_comparison",
    title: "Comparison by Load",
    group_by: &[GroupField::Protocol, GroupField::Vus],
    columns: &[
        Column::LatencyMean,
        Column::ThroughputRps,
        Column::ErrorRate,
    ],
    only: None,
};

pub const SCALABILITY: TableSpec = TableSpec {
    name: "scalability",
    title: "Scalability",
    group_by: &[GroupField::Protocol, GroupField::Replicas],
    columns: &[
        Column::ThroughputRps,
        Column::LatencyMean,
        Column::ErrorRate,
        Column::ThroughputGain,
    ],
    only: Some(TestType::Scalability),
};

pub const PROTOCOL_SUMMARY: TableSpec = TableSpec {
    name: "protocol_summary",
    title: "Protocol Summary",
    group_by: &[GroupField::Protocol],
    columns: &[
        Column::LatencyMean,
        Column::ThroughputRps,
        Column::SuccessRate,
        Column::Efficiency,
    ],
    only: None,
};

pub const LATENCY_PERCENTILES: TableSpec = TableSpec {
    name: "latency_percentiles",
    title: "Latency Percentiles",
    group_by: &[GroupField::Protocol],
    columns: &[Column::LatencyP50, Column::LatencyP95, Column::LatencyP99],
    only: None,
};

pub const TABLES: [TableSpec; 5] = [
    GENERAL,
    LOAD_COMPARISON,
    SCALABILITY,
    PROTOCOL_SUMMARY,
    LATENCY_PERCENTILES,
];

/// Metrics compared in the REST vs gRPC head-to-head.
pub const HEAD_TO_HEAD_COLUMNS: [Column; 7] = [
    Column::LatencyMean,
    Column::LatencyP50,
    Column::LatencyP95,
    Column::LatencyP99,
    Column::ThroughputRps,
    Column::SuccessRate,
    Column::Efficiency,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub key: GroupKey,
    pub runs: usize,
    /// One cell per column, rounded to two decimals.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: &'static str,
    pub title: &'static str,
    pub group_by: &'static [GroupField],
    pub columns: &'static [Column],
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn from_rows(spec: &TableSpec, rows: &[AggregateRow]) -> Self {
        let rows = rows
            .iter()
            .map(|r| {
                let base = baseline(rows, &r.key);
                TableRow {
                    key: r.key,
                    runs: r.runs,
                    values: spec
                        .columns
                        .iter()
                        .map(|c| round2(c.value(&r.means, base)))
                        .collect(),
                }
            })
            .collect();

        Self {
            name: spec.name,
            title: spec.title,
            group_by: spec.group_by,
            columns: spec.columns,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The 1-replica row sharing every other grouping field with `key`.
fn baseline<'a>(rows: &'a [AggregateRow], key: &GroupKey) -> Option<&'a StatValues> {
    key.replicas?;
    let base = GroupKey {
        replicas: Some(1),
        ..*key
    };
    rows.iter().find(|r| r.key == base).map(|r| &r.means)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum Winner {
    #[strum(to_string = "REST")]
    #[serde(rename = "REST")]
    Rest,
    #[strum(to_string = "gRPC")]
    #[serde(rename = "gRPC")]
    Grpc,
    #[strum(to_string = "tie")]
    #[serde(rename = "tie")]
    Tie,
}

/// One metric of the REST vs gRPC comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matchup {
    pub metric: Column,
    pub rest: f64,
    pub grpc: f64,
    /// gRPC minus REST.
    pub difference: f64,
    pub winner: Winner,
}

/// Per-protocol means compared metric by metric, rounded to two decimals.
///
/// Empty unless both protocols have at least one run.
pub fn head_to_head<T: AggregateInput>(items: &[T]) -> Vec<Matchup> {
    let rows = aggregate(items, &[GroupField::Protocol], |_: &CategoryKey| true);
    let (Some(rest), Some(grpc)) = (
        protocol_means(&rows, Protocol::Rest),
        protocol_means(&rows, Protocol::Grpc),
    ) else {
        return Vec::new();
    };

    HEAD_TO_HEAD_COLUMNS
        .iter()
        .map(|&metric| {
            let rest = round2(metric.value(&rest, None));
            let grpc = round2(metric.value(&grpc, None));
            let difference = round2(grpc - rest);
            let winner = if difference == 0.0 {
                Winner::Tie
            } else if (difference > 0.0) == metric.higher_is_better() {
                Winner::Grpc
            } else {
                Winner::Rest
            };
            Matchup {
                metric,
                rest,
                grpc,
                difference,
                winner,
            }
        })
        .collect()
}

fn protocol_means(rows: &[AggregateRow], protocol: Protocol) -> Option<StatValues> {
    let row = rows.iter().find(|r| r.key.protocol == Some(protocol))?;
    Some(row.means)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub total_runs: usize,
    /// Runs whose category fell back to a default for at least one field.
    pub defaulted_runs: usize,
    pub tables: Vec<Table>,
    pub head_to_head: Vec<Matchup>,
}

impl ComparisonReport {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

pub fn build_table<T: AggregateInput>(items: &[T], spec: &TableSpec) -> Table {
    let rows = aggregate(items, spec.group_by, |k| spec.accepts(k));
    Table::from_rows(spec, &rows)
}

/// Builds every standard table. Tables with no matching runs are kept, empty.
pub fn build_report<T: AggregateInput>(items: &[T]) -> ComparisonReport {
    ComparisonReport {
        total_runs: items.len(),
        defaulted_runs: items.iter().filter(|i| i.is_defaulted()).count(),
        tables: TABLES.iter().map(|spec| build_table(items, spec)).collect(),
        head_to_head: head_to_head(items),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{Protocol, RunMetadata};
    use crate::run::{AnalyzedRun, RunStatistics};
    use protobench_metrics::LatencyStats;

    fn run(name: &str, mean: f64, rps: f64, err: f64) -> AnalyzedRun {
        AnalyzedRun {
            stats: RunStatistics {
                filename: name.to_string(),
                total_metrics: 10,
                malformed_lines: 0,
                latency: Some(LatencyStats {
                    p50: mean,
                    p95: mean + 10.0,
                    p99: mean + 20.0,
                    mean,
                    min: 1.0,
                    max: mean + 30.0,
                }),
                throughput_rps: rps,
                error_rate_percent: err,
                data_sent_bytes: 0.0,
                data_received_bytes: 0.0,
                performance_score: 0.0,
            },
            metadata: RunMetadata::from_name(name),
        }
    }

    fn runs() -> Vec<AnalyzedRun> {
        vec![
            run("rest_monitoring.json", 40.0, 1000.0, 1.0),
            run("rest_scalability_2r.json", 50.0, 1500.0, 2.0),
            run("grpc_monitoring.json", 20.0, 2000.0, 0.0),
            run("grpc_scalability_4r.json", 25.0, 3000.0, 0.5),
            run("results.json", 30.0, 10.0, 0.0),
        ]
    }

    #[test]
    fn report_has_all_tables() {
        let report = build_report(&runs());
        let names: Vec<&str> = report.tables.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "general",
                "load_comparison",
                "scalability",
                "protocol_summary",
                "latency_percentiles"
            ]
        );
        assert_eq!(report.total_runs, 5);
        assert_eq!(report.defaulted_runs, 1);
    }

    #[test]
    fn general_table_groups_by_protocol() {
        let report = build_report(&runs());
        let general = report
            .table("general")
            .unwrap_or_else(|| panic!("missing general table"));

        assert_eq!(general.rows.len(), 2);
        let rest = &general.rows[0];
        assert_eq!(rest.key.protocol, Some(Protocol::Rest));
        assert_eq!(rest.runs, 3);
        // mean latency of 40, 50, 30
        assert_eq!(rest.values[0], 40.0);
        // throughput (1000 + 1500 + 10) / 3
        assert_eq!(rest.values[3], 836.67);
    }

    #[test]
    fn scalability_table_only_has_scalability_runs() {
        let report = build_report(&runs());
        let table = report
            .table("scalability")
            .unwrap_or_else(|| panic!("missing scalability table"));

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].key.replicas, Some(2));
        assert_eq!(table.rows[1].key.replicas, Some(4));
        assert_eq!(table.rows[1].values[0], 3000.0);
    }

    #[test]
    fn protocol_summary_derives_success_and_efficiency() {
        let report = build_report(&runs());
        let table = report
            .table("protocol_summary")
            .unwrap_or_else(|| panic!("missing protocol_summary table"));

        let grpc = &table.rows[1];
        assert_eq!(grpc.key.protocol, Some(Protocol::Grpc));
        // latency mean 22.5, throughput 2500, error rate 0.25
        assert_eq!(grpc.values[1], 2500.0);
        assert_eq!(grpc.values[2], 99.75);
        assert!((grpc.values[3] - 111_111.11).abs() < 0.011);
    }

    #[test]
    fn efficiency_is_zero_without_latency() {
        let m = StatValues {
            throughput_rps: 100.0,
            ..StatValues::default()
        };
        assert_eq!(Column::Efficiency.value(&m, None), 0.0);
        assert_eq!(Column::SuccessRate.value(&m, None), 100.0);
        assert_eq!(Column::ThroughputGain.value(&m, None), 0.0);
    }

    #[test]
    fn scalability_gain_is_relative_to_one_replica() {
        let runs = vec![
            run("rest_scalability_1r.json", 50.0, 1000.0, 0.0),
            run("rest_scalability_2r.json", 50.0, 1100.0, 0.0),
            run("rest_scalability_4r.json", 50.0, 900.0, 0.0),
            run("grpc_scalability_2r.json", 50.0, 1200.0, 0.0),
            run("grpc_scalability_4r.json", 50.0, 1800.0, 0.0),
        ];
        let table = build_table(&runs, &SCALABILITY);
        let gain = |protocol: Protocol, replicas: u32| {
            table
                .rows
                .iter()
                .find(|r| r.key.protocol == Some(protocol) && r.key.replicas == Some(replicas))
                .map(|r| r.values[3])
                .unwrap_or_else(|| panic!("missing row {protocol} {replicas}"))
        };

        assert_eq!(gain(Protocol::Rest, 1), 0.0);
        assert_eq!(gain(Protocol::Rest, 2), 10.0);
        assert_eq!(gain(Protocol::Rest, 4), -10.0);
        // No 1-replica gRPC run to compare against.
        assert_eq!(gain(Protocol::Grpc, 2), 0.0);
        assert_eq!(gain(Protocol::Grpc, 4), 0.0);
    }

    #[test]
    fn latency_percentiles_table_uses_p50() {
        let report = build_report(&runs());
        let table = report
            .table("latency_percentiles")
            .unwrap_or_else(|| panic!("missing latency_percentiles table"));

        assert_eq!(
            table.columns,
            &[Column::LatencyP50, Column::LatencyP95, Column::LatencyP99]
        );
        let grpc = &table.rows[1];
        assert_eq!(grpc.key.protocol, Some(Protocol::Grpc));
        // p50 is the run mean in these fixtures: (20 + 25) / 2
        assert_eq!(grpc.values, vec![22.5, 32.5, 42.5]);
    }

    #[test]
    fn head_to_head_picks_winner_by_direction() {
        let runs = vec![
            run("rest_monitoring.json", 40.0, 1000.0, 0.0),
            run("grpc_monitoring.json", 30.0, 900.0, 0.0),
        ];
        let rows = head_to_head(&runs);
        assert_eq!(rows.len(), HEAD_TO_HEAD_COLUMNS.len());

        let of = |c: Column| {
            rows.iter()
                .find(|m| m.metric == c)
                .unwrap_or_else(|| panic!("missing {c}"))
        };

        let mean = of(Column::LatencyMean);
        assert_eq!((mean.rest, mean.grpc, mean.difference), (40.0, 30.0, -10.0));
        assert_eq!(mean.winner, Winner::Grpc);

        let tput = of(Column::ThroughputRps);
        assert_eq!(tput.difference, -100.0);
        assert_eq!(tput.winner, Winner::Rest);

        let success = of(Column::SuccessRate);
        assert_eq!(success.difference, 0.0);
        assert_eq!(success.winner, Winner::Tie);

        // 900 / 0.03 = 30000 beats 1000 / 0.04 = 25000
        let eff = of(Column::Efficiency);
        assert_eq!(eff.winner, Winner::Grpc);
    }

    #[test]
    fn head_to_head_needs_both_protocols() {
        let only_rest = vec![run("rest_monitoring.json", 40.0, 1000.0, 0.0)];
        assert!(head_to_head(&only_rest).is_empty());
        assert!(build_report(&only_rest).head_to_head.is_empty());
        assert_eq!(build_report(&runs()).head_to_head.len(), 7);
    }

    #[test]
    fn empty_input_gives_empty_tables() {
        let none: Vec<AnalyzedRun> = Vec::new();
        let report = build_report(&none);
        assert_eq!(report.total_runs, 0);
        assert!(report.tables.iter().all(Table::is_empty));
    }
}
