use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use protobench_core::{DetailedReport, RunReport, build_report};
use tracing::{debug, info};

use crate::cli::AnalyzeArgs;
use crate::config_yaml::{Settings, load_config_yaml};
use crate::discover::{discover, existing_inputs, load_and_analyze};
use crate::exit_codes::ExitCode;
use crate::output::{self, BatchInfo};
use crate::run_error::RunError;

pub async fn analyze(args: AnalyzeArgs) -> Result<ExitCode, RunError> {
    let file_cfg = match &args.config {
        Some(path) => Some(load_config_yaml(path).await.map_err(RunError::InvalidInput)?),
        None => None,
    };
    let settings = Settings::resolve(&args, file_cfg).map_err(RunError::InvalidInput)?;
    debug!(?settings, "resolved settings");

    let inputs = if settings.default_inputs {
        existing_inputs(&settings.inputs).await
    } else {
        settings.inputs.clone()
    };
    let files = discover(&inputs, &settings.extensions).await;
    if files.is_empty() {
        eprintln!(
            "no result files found (searched: {})",
            settings
                .inputs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        return Ok(ExitCode::NoRuns);
    }
    info!(files = files.len(), "analyzing result files");

    let outcome = load_and_analyze(files, Arc::new(settings.analysis))
        .await
        .map_err(RunError::RuntimeError)?;
    let info = BatchInfo {
        unreadable_files: outcome.unreadable,
    };

    if outcome.runs.is_empty() {
        eprintln!("no result file could be read");
        return Ok(ExitCode::NoRuns);
    }

    let out = output::formatter(args.output);
    let reports: Vec<RunReport> = outcome.runs.iter().map(RunReport::from).collect();
    out.print_runs(&reports);
    out.print_report(&build_report(&outcome.runs), info)
        .map_err(RunError::RuntimeError)?;

    if let Some(path) = &settings.export {
        export(&DetailedReport::new(&outcome.runs), path)
            .await
            .map_err(RunError::RuntimeError)?;
        info!(path = %path.display(), "detailed report written");
    }

    Ok(ExitCode::from_run_count(outcome.runs.len()))
}

async fn export(doc: &DetailedReport, path: &Path) -> anyhow::Result<()> {
    let json = doc.to_json_pretty().context("serialize detailed report")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write report: {}", path.display()))
}
