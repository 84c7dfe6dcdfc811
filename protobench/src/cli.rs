use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

fn parse_window(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 60s, 1m, 90s)".to_string());
    }

    // Bare numbers are seconds.
    let d = match s.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => match humantime::parse_duration(s) {
            Ok(d) => d,
            Err(e) => return Err(format!("invalid duration '{s}': {e}")),
        },
    };

    if d.is_zero() {
        return Err(format!("duration '{s}' must be positive"));
    }
    Ok(d)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    HumanReadable,
    /// Emit one JSON object per line (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "protobench",
    author,
    version,
    about = "REST vs gRPC load-test report builder",
    long_about = "protobench reads k6 `--out json` result files, computes latency percentiles, throughput and error rate per run, and prints comparison tables grouped by protocol, load and replica count.\n\nProtocol, test type, VU count and replica count are taken from the run file name (e.g. `grpc_scalability_4r.json`) unless a config file states them explicitly.",
    after_help = "Examples:\n  protobench analyze results/\n  protobench analyze --dir k6-tests/results --output json\n  protobench analyze results/ --export report.json\n  protobench tables report.json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze k6 result files and print comparison tables
    #[command(
        long_about = "Analyze k6 result files and print comparison tables.\n\nCLI flags override environment variables, which override values from the config file."
    )]
    Analyze(AnalyzeArgs),

    /// Rebuild comparison tables from an exported report
    Tables(TablesArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Result files or directories to analyze
    pub paths: Vec<PathBuf>,

    /// Directory to search for result files (repeatable)
    #[arg(
        long = "dir",
        value_name = "DIR",
        env = "PROTOBENCH_DIRS",
        value_delimiter = ','
    )]
    pub dirs: Vec<PathBuf>,

    /// YAML config file
    #[arg(long, value_name = "FILE", env = "PROTOBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// File extension of result files (repeatable, without the dot)
    #[arg(
        long = "extension",
        value_name = "EXT",
        env = "PROTOBENCH_EXTENSIONS",
        value_delimiter = ','
    )]
    pub extensions: Vec<String>,

    /// Window used when a run's time span cannot be observed (e.g. 60s, 2m)
    #[arg(
        long,
        value_parser = parse_window,
        env = "PROTOBENCH_FALLBACK_WINDOW"
    )]
    pub fallback_window: Option<Duration>,

    /// Write the detailed per-run report as JSON to this file
    #[arg(long, value_name = "FILE", env = "PROTOBENCH_EXPORT")]
    pub export: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        value_enum,
        env = "PROTOBENCH_OUTPUT",
        default_value_t = OutputFormat::HumanReadable
    )]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct TablesArgs {
    /// Detailed report written by `protobench analyze --export`
    pub report: PathBuf,

    /// Output format
    #[arg(
        long,
        value_enum,
        env = "PROTOBENCH_OUTPUT",
        default_value_t = OutputFormat::HumanReadable
    )]
    pub output: OutputFormat,
}
