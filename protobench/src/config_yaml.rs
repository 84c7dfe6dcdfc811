use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use protobench_core::{AnalysisConfig, MetricNames, RunOverride};

use crate::cli::AnalyzeArgs;

pub(crate) const DEFAULT_EXTENSIONS: [&str; 1] = ["json"];

/// Directories searched, in order, when neither the CLI nor the config names any input.
pub(crate) const DEFAULT_SEARCH_DIRS: [&str; 6] = [
    "results",
    "monitoring-results",
    "k6-results-resilience-improved",
    "k6-results-resilience",
    "k6-results",
    ".",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ConfigYaml {
    /// Directories searched for result files. Relative paths resolve against the config file.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub search_dirs: Vec<PathBuf>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub metrics: MetricsYaml,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fallback_window: Option<YamlDuration>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub malformed_log_limit: Option<usize>,

    /// Explicit metadata per run name.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub runs: Vec<RunOverride>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct MetricsYaml {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_requests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_sent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_received: Option<String>,
}

impl MetricsYaml {
    fn apply(self, names: &mut MetricNames) {
        let slots = [
            (self.latency, &mut names.latency),
            (self.requests, &mut names.requests),
            (self.failed_requests, &mut names.failed_requests),
            (self.iterations, &mut names.iterations),
            (self.data_sent, &mut names.data_sent),
            (self.data_received, &mut names.data_received),
        ];
        for (value, slot) in slots {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct YamlDuration(Duration);

impl YamlDuration {
    fn into_inner(self) -> Duration {
        self.0
    }
}

impl Serialize for YamlDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(self.0).to_string())
    }
}

impl<'de> Deserialize<'de> for YamlDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl<'de> serde::de::Visitor<'de> for V {
            type Value = YamlDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("duration as string (e.g. 60s), integer seconds, or float seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v == 0 {
                    return Err(E::custom("duration must be positive"));
                }
                Ok(YamlDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v <= 0 {
                    return Err(E::custom("duration must be positive"));
                }
                Ok(YamlDuration(Duration::from_secs(v as u64)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if !v.is_finite() || v <= 0.0 {
                    return Err(E::custom("duration must be a positive, finite number"));
                }
                Ok(YamlDuration(Duration::from_secs_f64(v)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let d = humantime::parse_duration(v).map_err(E::custom)?;
                Ok(YamlDuration(d))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&v)
            }
        }

        deserializer.deserialize_any(V)
    }
}

pub(crate) fn parse_config_yaml(text: &str, base_dir: &Path) -> anyhow::Result<ConfigYaml> {
    let mut doc: ConfigYaml = if text.trim().is_empty() {
        ConfigYaml::default()
    } else {
        serde_yaml::from_str(text).context("invalid config yaml")?
    };

    doc.search_dirs = doc
        .search_dirs
        .into_iter()
        .map(|d| if d.is_relative() { base_dir.join(d) } else { d })
        .collect();

    Ok(doc)
}

pub(crate) async fn load_config_yaml(path: &Path) -> anyhow::Result<ConfigYaml> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_config_yaml(&text, base_dir)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Effective settings for one `analyze` invocation.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    /// Files and directories to scan, in priority order.
    pub inputs: Vec<PathBuf>,
    /// `inputs` is the built-in search list; absent entries are expected.
    pub default_inputs: bool,
    pub extensions: Vec<String>,
    pub analysis: AnalysisConfig,
    pub export: Option<PathBuf>,
}

impl Settings {
    /// Merges CLI/env values over the config file over built-in defaults.
    pub(crate) fn resolve(args: &AnalyzeArgs, file: Option<ConfigYaml>) -> anyhow::Result<Self> {
        let file = file.unwrap_or_default();

        let mut inputs: Vec<PathBuf> = args.paths.iter().chain(&args.dirs).cloned().collect();
        if inputs.is_empty() {
            inputs = file.search_dirs;
        }
        let default_inputs = inputs.is_empty();
        if default_inputs {
            inputs = DEFAULT_SEARCH_DIRS.iter().map(PathBuf::from).collect();
        }

        let mut extensions = if !args.extensions.is_empty() {
            args.extensions.clone()
        } else if !file.extensions.is_empty() {
            file.extensions
        } else {
            DEFAULT_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect()
        };
        for e in &mut extensions {
            *e = e.trim().trim_start_matches('.').to_ascii_lowercase();
        }
        extensions.retain(|e| !e.is_empty());
        anyhow::ensure!(
            !extensions.is_empty(),
            "at least one file extension is required"
        );

        let mut analysis = AnalysisConfig::default();
        file.metrics.apply(&mut analysis.metrics);
        if let Some(w) = file.fallback_window {
            analysis.fallback_window = w.into_inner();
        }
        if let Some(w) = args.fallback_window {
            analysis.fallback_window = w;
        }
        if let Some(limit) = file.malformed_log_limit {
            analysis.malformed_log_limit = limit;
        }
        analysis.overrides = file.runs;

        analysis.validate().context("invalid analysis settings")?;

        Ok(Self {
            inputs,
            default_inputs,
            extensions,
            analysis,
            export: args.export.clone(),
        })
    }
}
