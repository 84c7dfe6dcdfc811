use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;

use protobench_core::{ComparisonReport, GroupKey, Matchup, RunReport, Table};

use super::{BatchInfo, OutputFormatter};

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_runs(&self, runs: &[RunReport]) {
        for run in runs {
            emit_json_line(&JsonRunLine { kind: "run", run });
        }
    }

    fn print_report(&self, report: &ComparisonReport, info: BatchInfo) -> anyhow::Result<()> {
        let line = build_report_line(report, info);
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonRunLine<'a> {
    pub kind: &'static str,
    #[serde(flatten)]
    pub run: &'a RunReport,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonReportLine {
    pub kind: &'static str,
    pub total_runs: usize,
    pub defaulted_runs: usize,
    pub unreadable_files: usize,
    pub tables: Vec<JsonTable>,
    /// REST vs gRPC per metric; empty unless both protocols ran.
    pub head_to_head: Vec<Matchup>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonTable {
    pub name: &'static str,
    pub title: &'static str,
    pub rows: Vec<JsonTableRow>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonTableRow {
    #[serde(flatten)]
    pub key: GroupKey,
    pub runs: usize,
    /// Column name to cell value.
    pub values: BTreeMap<String, f64>,
}

fn build_table(table: &Table) -> JsonTable {
    let rows = table
        .rows
        .iter()
        .map(|r| JsonTableRow {
            key: r.key,
            runs: r.runs,
            values: table
                .columns
                .iter()
                .map(ToString::to_string)
                .zip(r.values.iter().copied())
                .collect(),
        })
        .collect();

    JsonTable {
        name: table.name,
        title: table.title,
        rows,
    }
}

fn build_report_line(report: &ComparisonReport, info: BatchInfo) -> JsonReportLine {
    JsonReportLine {
        kind: "report",
        total_runs: report.total_runs,
        defaulted_runs: report.defaulted_runs,
        unreadable_files: info.unreadable_files,
        tables: report.tables.iter().map(build_table).collect(),
        head_to_head: report.head_to_head.clone(),
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
