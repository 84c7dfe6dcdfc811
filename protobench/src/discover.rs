use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use protobench_core::{AnalysisConfig, AnalyzedRun, Run};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// A result file picked for analysis. `name` is the file name and doubles as the run name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunFile {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub(crate) struct LoadOutcome {
    /// Analyzed runs, in discovery order.
    pub runs: Vec<AnalyzedRun>,
    /// Files that could not be read.
    pub unreadable: usize,
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

async fn list_dir(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut out = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && has_extension(&path, extensions) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Expands inputs into result files.
///
/// Directories are scanned one level deep for matching extensions; files given
/// directly are taken as-is. Missing inputs are logged and skipped. When two
/// inputs yield the same file name the first one wins.
pub(crate) async fn discover(inputs: &[PathBuf], extensions: &[String]) -> Vec<RunFile> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        let meta = match tokio::fs::metadata(input).await {
            Ok(m) => m,
            Err(err) => {
                warn!(path = %input.display(), error = %err, "skipping input");
                continue;
            }
        };

        let candidates = if meta.is_dir() {
            match list_dir(input, extensions).await {
                Ok(paths) => paths,
                Err(err) => {
                    warn!(path = %input.display(), error = %err, "cannot list directory");
                    continue;
                }
            }
        } else {
            vec![input.clone()]
        };

        for path in candidates {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if !seen.insert(name.clone()) {
                warn!(path = %path.display(), "duplicate run name; keeping the first");
                continue;
            }
            files.push(RunFile { name, path });
        }
    }

    files
}

/// Keeps the candidates that exist, in order. Absent ones are not an error.
pub(crate) async fn existing_inputs(candidates: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in candidates {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            out.push(path.clone());
        } else {
            debug!(path = %path.display(), "default search directory not present");
        }
    }
    out
}

fn max_in_flight() -> usize {
    std::thread::available_parallelism().map_or(4, NonZeroUsize::get)
}

/// Streams one file through the parser. `None` when it cannot be read.
fn analyze_file(name: String, path: &Path, cfg: &AnalysisConfig) -> Option<AnalyzedRun> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read run file; skipping");
            return None;
        }
    };

    match Run::from_reader(name, BufReader::new(file), cfg) {
        Ok(run) => Some(run.analyze(cfg)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read run file; skipping");
            None
        }
    }
}

async fn load_one(
    idx: usize,
    file: RunFile,
    cfg: Arc<AnalysisConfig>,
    permits: Arc<Semaphore>,
) -> anyhow::Result<Option<(usize, AnalyzedRun)>> {
    let _permit = permits
        .acquire_owned()
        .await
        .context("load limiter closed")?;

    let RunFile { name, path } = file;
    let run = tokio::task::spawn_blocking(move || analyze_file(name, &path, &cfg))
        .await
        .context("analysis task failed")?;

    Ok(run.map(|run| (idx, run)))
}

/// Reads and analyzes every file on the blocking pool, a bounded number at a time.
///
/// Unreadable files are logged and counted; they never abort the batch.
pub(crate) async fn load_and_analyze(
    files: Vec<RunFile>,
    cfg: Arc<AnalysisConfig>,
) -> anyhow::Result<LoadOutcome> {
    load_with_limit(files, cfg, max_in_flight()).await
}

async fn load_with_limit(
    files: Vec<RunFile>,
    cfg: Arc<AnalysisConfig>,
    limit: usize,
) -> anyhow::Result<LoadOutcome> {
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let mut set = JoinSet::new();

    for (idx, file) in files.into_iter().enumerate() {
        set.spawn(load_one(idx, file, cfg.clone(), permits.clone()));
    }

    let mut outcome = LoadOutcome::default();
    let mut indexed = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined.context("load task failed")?? {
            Some(item) => indexed.push(item),
            None => outcome.unreadable += 1,
        }
    }

    indexed.sort_by_key(|(idx, _)| *idx);
    outcome.runs = indexed.into_iter().map(|(_, run)| run).collect();
    Ok(outcome)
}
