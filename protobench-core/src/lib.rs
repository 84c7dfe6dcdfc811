//! Metrics extraction and aggregation for load-test comparison reports.
//!
//! A run is a stream of k6 `--out json` records. Runs are decoded
//! ([`parser`]), reduced to per-run statistics ([`run`]), grouped by
//! category ([`aggregate`]) and finally laid out as comparison tables
//! ([`report`]).

pub mod aggregate;
pub mod category;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod extract;
pub mod parser;
pub mod report;
pub mod run;

pub use aggregate::{
    AggregateInput, AggregateRow, GroupField, GroupKey, StatValues, aggregate, aggregate_all,
};
pub use category::{
    CategoryKey, DefaultedField, Protocol, REPLICA_COUNTS, RunMetadata, RunOverride, TestType,
};
pub use config::{AnalysisConfig, MetricNames};
pub use document::{DetailedReport, LatencySummary, RunReport};
pub use error::{Error, Result};
pub use event::{Event, EventKind, Sample};
pub use extract::{MetricIndex, extract};
pub use parser::{DEFAULT_MALFORMED_LOG_LIMIT, EventReader, ParseStats, parse_lines, parse_str};
pub use report::{
    Column, ComparisonReport, HEAD_TO_HEAD_COLUMNS, Matchup, Table, TableRow, TableSpec, Winner,
    build_report, build_table, head_to_head,
};
pub use run::{AnalyzedRun, Run, RunStatistics};
