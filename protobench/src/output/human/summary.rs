use std::fmt::Write as _;

use protobench_core::{
    AggregateInput, ComparisonReport, GroupField, GroupKey, Matchup, RunReport, Table,
};

use super::format::*;

pub(crate) fn render_run(run: &RunReport, out: &mut String) {
    writeln!(
        out,
        "run: {} ({} {} vus={} replicas={})",
        run.filename, run.protocol, run.test_type, run.vus, run.replicas
    )
    .ok();
    writeln!(
        out,
        "  records: {} (malformed {})",
        run.total_metrics, run.malformed_lines
    )
    .ok();

    let l = &run.latency;
    if l.mean.is_some() {
        let v = run.stat_values();
        writeln!(
            out,
            "  latency = p50={} p95={} p99={} mean={} min={} max={} (ms)",
            format_num(v.latency_p50),
            format_num(v.latency_p95),
            format_num(v.latency_p99),
            format_num(v.latency_mean),
            format_num(v.latency_min),
            format_num(v.latency_max),
        )
        .ok();
    } else {
        out.push_str("  latency: n/a\n");
    }

    writeln!(
        out,
        "  throughput: {} req/s",
        format_num(run.throughput_rps)
    )
    .ok();
    writeln!(out, "  error_rate: {}%", format_num(run.error_rate_percent)).ok();
    writeln!(
        out,
        "  bytes: recv {} sent {}",
        format_bytes(run.data_received_bytes),
        format_bytes(run.data_sent_bytes)
    )
    .ok();
    writeln!(out, "  score: {}", format_num(run.performance_score)).ok();

    if !run.defaulted.is_empty() {
        let fields: Vec<String> = run.defaulted.iter().map(ToString::to_string).collect();
        writeln!(out, "  defaulted: {}", fields.join(",")).ok();
    }

    out.push('\n');
}

pub(crate) fn render_report(report: &ComparisonReport) -> String {
    let mut out = String::new();

    if report.total_runs == 0 {
        out.push_str("report: no runs\n");
        return out;
    }

    for table in &report.tables {
        render_table(table, &mut out);
        out.push('\n');
    }

    if !report.head_to_head.is_empty() {
        render_head_to_head(&report.head_to_head, &mut out);
        out.push('\n');
    }

    out
}

fn render_head_to_head(rows: &[Matchup], out: &mut String) {
    out.push_str("REST vs gRPC\n");

    let headers: Vec<String> = ["Metric", "REST", "gRPC", "Difference", "Winner"]
        .iter()
        .map(|h| (*h).to_string())
        .collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|m| {
            vec![
                m.metric.label().to_string(),
                format_num(m.rest),
                format_num(m.grpc),
                format_delta(m.difference),
                m.winner.to_string(),
            ]
        })
        .collect();

    out.push_str(&format_table(&headers, &rows));
}

fn render_table(table: &Table, out: &mut String) {
    if table.is_empty() {
        writeln!(out, "{}: no matching runs", table.title).ok();
        return;
    }

    writeln!(out, "{}", table.title).ok();

    let mut headers: Vec<String> = table
        .group_by
        .iter()
        .map(|f| field_header(*f).to_string())
        .collect();
    headers.push("Runs".to_string());
    headers.extend(table.columns.iter().map(|c| c.label().to_string()));

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            let mut cells: Vec<String> = table
                .group_by
                .iter()
                .map(|f| field_value(&r.key, *f))
                .collect();
            cells.push(r.runs.to_string());
            cells.extend(r.values.iter().map(|v| format_num(*v)));
            cells
        })
        .collect();

    out.push_str(&format_table(&headers, &rows));
}

fn field_header(f: GroupField) -> &'static str {
    match f {
        GroupField::Protocol => "Protocol",
        GroupField::TestType => "Test Type",
        GroupField::Vus => "VUs",
        GroupField::Replicas => "Replicas",
    }
}

fn field_value(key: &GroupKey, f: GroupField) -> String {
    let v = match f {
        GroupField::Protocol => key.protocol.map(|p| p.to_string()),
        GroupField::TestType => key.test_type.map(|t| t.to_string()),
        GroupField::Vus => key.vus.map(|v| v.to_string()),
        GroupField::Replicas => key.replicas.map(|r| r.to_string()),
    };
    v.unwrap_or_else(|| "-".to_string())
}
