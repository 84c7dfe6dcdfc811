use std::fmt::Write as _;

mod format;
mod summary;

use protobench_core::{ComparisonReport, RunReport};

use super::{BatchInfo, OutputFormatter};

pub(crate) struct HumanReadableOutput;

impl OutputFormatter for HumanReadableOutput {
    fn print_runs(&self, runs: &[RunReport]) {
        let mut out = String::new();
        for run in runs {
            summary::render_run(run, &mut out);
        }
        if !out.is_empty() {
            print!("{out}");
        }
    }

    fn print_report(&self, report: &ComparisonReport, info: BatchInfo) -> anyhow::Result<()> {
        let mut out = summary::render_report(report);
        write!(
            &mut out,
            "runs: {} (defaulted {}",
            report.total_runs, report.defaulted_runs
        )
        .ok();
        if info.unreadable_files > 0 {
            write!(&mut out, ", unreadable files {}", info.unreadable_files).ok();
        }
        out.push_str(")\n");

        print!("{out}");
        Ok(())
    }
}
