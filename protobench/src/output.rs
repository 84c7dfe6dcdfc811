use crate::cli::OutputFormat;
use protobench_core::{ComparisonReport, RunReport};

mod human;
mod json;

/// Batch-level facts printed alongside the tables.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BatchInfo {
    pub unreadable_files: usize,
}

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_runs(&self, runs: &[RunReport]);
    fn print_report(&self, report: &ComparisonReport, info: BatchInfo) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
