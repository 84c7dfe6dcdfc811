use anyhow::Context as _;
use protobench_core::{DetailedReport, build_report};

use crate::cli::TablesArgs;
use crate::exit_codes::ExitCode;
use crate::output::{self, BatchInfo};
use crate::run_error::RunError;

/// Rebuilds the comparison tables from an exported detailed report.
pub async fn tables(args: TablesArgs) -> Result<ExitCode, RunError> {
    let text = tokio::fs::read_to_string(&args.report)
        .await
        .with_context(|| format!("failed to read report: {}", args.report.display()))
        .map_err(RunError::InvalidInput)?;

    let doc = DetailedReport::from_json(&text)
        .with_context(|| format!("failed to parse report: {}", args.report.display()))
        .map_err(RunError::InvalidInput)?;

    let runs = doc.runs();
    if runs.is_empty() {
        eprintln!("report contains no runs: {}", args.report.display());
        return Ok(ExitCode::NoRuns);
    }

    let out = output::formatter(args.output);
    out.print_report(&build_report(&runs), BatchInfo::default())
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::Success)
}
