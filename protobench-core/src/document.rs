//! Exported per-run report document.
//!
//! The document can be read back to rebuild the comparison tables without
//! the raw load-test logs. Reports written by older tooling may omit latency
//! fields or the classification; missing latency reads as zero and missing
//! classification is recovered from the run name.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateInput, StatValues};
use crate::category::{CategoryKey, DefaultedField, Protocol, RunMetadata, TestType};
use crate::error::Result;
use crate::run::AnalyzedRun;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Latency block of an exported run. Every field is optional on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p50: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub filename: String,
    pub total_metrics: usize,
    pub malformed_lines: usize,
    pub latency: LatencySummary,
    pub throughput_rps: f64,
    pub error_rate_percent: f64,
    pub data_sent_bytes: f64,
    pub data_received_bytes: f64,
    pub performance_score: f64,
    pub protocol: Protocol,
    pub test_type: TestType,
    pub vus: u32,
    pub replicas: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<DefaultedField>,
}

impl From<&AnalyzedRun> for RunReport {
    fn from(run: &AnalyzedRun) -> Self {
        let s = &run.stats;
        let latency = s
            .latency
            .map(|l| LatencySummary {
                p50: Some(l.p50),
                p95: Some(l.p95),
                p99: Some(l.p99),
                mean: Some(l.mean),
                min: Some(l.min),
                max: Some(l.max),
            })
            .unwrap_or_default();
        let key = run.metadata.key;

        Self {
            filename: s.filename.clone(),
            total_metrics: s.total_metrics,
            malformed_lines: s.malformed_lines,
            latency,
            throughput_rps: s.throughput_rps,
            error_rate_percent: s.error_rate_percent,
            data_sent_bytes: s.data_sent_bytes,
            data_received_bytes: s.data_received_bytes,
            performance_score: s.performance_score,
            protocol: key.protocol,
            test_type: key.test_type,
            vus: key.vus,
            replicas: key.replicas,
            defaulted: run.metadata.defaulted.to_vec(),
        }
    }
}

impl AggregateInput for RunReport {
    fn category(&self) -> CategoryKey {
        CategoryKey {
            protocol: self.protocol,
            test_type: self.test_type,
            vus: self.vus,
            replicas: self.replicas,
        }
    }

    fn stat_values(&self) -> StatValues {
        let l = &self.latency;
        StatValues {
            latency_p50: l.p50.unwrap_or(0.0),
            latency_p95: l.p95.unwrap_or(0.0),
            latency_p99: l.p99.unwrap_or(0.0),
            latency_mean: l.mean.unwrap_or(0.0),
            latency_min: l.min.unwrap_or(0.0),
            latency_max: l.max.unwrap_or(0.0),
            throughput_rps: self.throughput_rps,
            error_rate: self.error_rate_percent,
        }
    }

    fn is_defaulted(&self) -> bool {
        !self.defaulted.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedReport {
    /// UTC generation time, `YYYY-MM-DD HH:MM:SS`.
    #[serde(rename = "timestamp")]
    pub generated_at: String,
    pub total_files: usize,
    pub tests: BTreeMap<String, RunReport>,
}

impl DetailedReport {
    pub fn new(runs: &[AnalyzedRun]) -> Self {
        let tests: BTreeMap<String, RunReport> = runs
            .iter()
            .map(|r| (r.stats.filename.clone(), RunReport::from(r)))
            .collect();

        Self {
            generated_at: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            total_files: tests.len(),
            tests,
        }
    }

    pub fn runs(&self) -> Vec<RunReport> {
        self.tests.values().cloned().collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawReport = serde_json::from_str(text)?;

        let tests: BTreeMap<String, RunReport> = raw
            .tests
            .into_iter()
            .map(|(name, run)| {
                let report = run.into_report(&name);
                (name, report)
            })
            .collect();

        Ok(Self {
            generated_at: raw.timestamp.unwrap_or_default(),
            total_files: raw.total_files.unwrap_or(tests.len()),
            tests,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    total_files: Option<usize>,
    #[serde(default)]
    tests: BTreeMap<String, RawRunReport>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRunReport {
    filename: Option<String>,
    total_metrics: usize,
    malformed_lines: usize,
    latency: Option<LatencySummary>,
    throughput_rps: f64,
    error_rate_percent: f64,
    data_sent_bytes: f64,
    data_received_bytes: f64,
    performance_score: Option<f64>,
    protocol: Option<Protocol>,
    test_type: Option<TestType>,
    vus: Option<u32>,
    replicas: Option<u32>,
    defaulted: Option<Vec<DefaultedField>>,
}

impl RawRunReport {
    fn into_report(self, key: &str) -> RunReport {
        let filename = self.filename.unwrap_or_else(|| key.to_string());
        let latency = self.latency.unwrap_or_default();

        let named = RunMetadata::from_name(&filename);
        let explicit = self.protocol.is_some() && self.test_type.is_some();
        let defaulted = match self.defaulted {
            Some(d) => d,
            None if explicit => Vec::new(),
            None => named.defaulted.to_vec(),
        };

        let performance_score = self.performance_score.unwrap_or_else(|| {
            protobench_metrics::performance_score(
                self.throughput_rps,
                latency.p95.unwrap_or(0.0),
                self.error_rate_percent,
            )
        });

        RunReport {
            filename,
            total_metrics: self.total_metrics,
            malformed_lines: self.malformed_lines,
            latency,
            throughput_rps: self.throughput_rps,
            error_rate_percent: self.error_rate_percent,
            data_sent_bytes: self.data_sent_bytes,
            data_received_bytes: self.data_received_bytes,
            performance_score,
            protocol: self.protocol.unwrap_or(named.key.protocol),
            test_type: self.test_type.unwrap_or(named.key.test_type),
            vus: self.vus.unwrap_or(named.key.vus),
            replicas: self.replicas.unwrap_or(named.key.replicas),
            defaulted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::report::build_report;
    use crate::run::Run;

    fn analyzed(name: &str, text: &str) -> AnalyzedRun {
        let cfg = AnalysisConfig::default();
        Run::from_text(name, text, &cfg).analyze(&cfg)
    }

    const LOG: &str = concat!(
        r#"{"type":"Point","metric":"http_req_duration","data":{"time":"2024-01-01T00:00:00Z","value":100}}"#,
        "\n",
        r#"{"type":"Point","metric":"http_req_duration","data":{"time":"2024-01-01T00:00:01Z","value":200}}"#,
        "\n",
        r#"{"type":"Point","metric":"iterations","data":{"time":"2024-01-01T00:00:00Z","value":1}}"#,
        "\n",
        r#"{"type":"Point","metric":"iterations","data":{"time":"2024-01-01T00:00:04Z","value":1}}"#,
    );

    #[test]
    fn export_and_reread_rebuilds_same_tables() {
        let runs = vec![
            analyzed("rest_monitoring.json", LOG),
            analyzed("grpc_scalability_4r.json", LOG),
            analyzed("empty.json", ""),
        ];

        let doc = DetailedReport::new(&runs);
        assert_eq!(doc.total_files, 3);
        assert_eq!(doc.generated_at.len(), 19);

        let json = doc
            .to_json_pretty()
            .unwrap_or_else(|e| panic!("serialize: {e}"));
        let back = DetailedReport::from_json(&json).unwrap_or_else(|e| panic!("parse: {e}"));

        assert_eq!(back.generated_at, doc.generated_at);
        assert_eq!(back.total_files, 3);
        assert_eq!(
            back.tests.keys().collect::<Vec<_>>(),
            doc.tests.keys().collect::<Vec<_>>()
        );
        assert_eq!(
            back.tests["empty.json"].defaulted,
            doc.tests["empty.json"].defaulted
        );
        assert_eq!(build_report(&back.runs()), build_report(&runs));
    }

    #[test]
    fn run_without_latency_exports_empty_block() {
        let runs = vec![analyzed("rest_monitoring.json", "")];
        let doc = DetailedReport::new(&runs);
        let json = doc
            .to_json_pretty()
            .unwrap_or_else(|e| panic!("serialize: {e}"));

        let v: serde_json::Value =
            serde_json::from_str(&json).unwrap_or_else(|e| panic!("json: {e}"));
        assert_eq!(
            v["tests"]["rest_monitoring.json"]["latency"],
            serde_json::json!({})
        );
    }

    #[test]
    fn partial_legacy_report_is_accepted() {
        let json = r#"{
            "timestamp": "2024-05-01 10:00:00",
            "total_files": 2,
            "tests": {
                "rest_scalability_2r": {
                    "filename": "rest_scalability_2r",
                    "latency": {"mean": 513.1, "p95": 519.18},
                    "throughput_rps": 98.78,
                    "error_rate_percent": 0
                },
                "custom": {
                    "protocol": "gRPC",
                    "test_type": "monitoring",
                    "vus": 300,
                    "replicas": 1,
                    "latency": {},
                    "throughput_rps": 10.0,
                    "error_rate_percent": 5
                }
            }
        }"#;

        let doc = DetailedReport::from_json(json).unwrap_or_else(|e| panic!("parse: {e}"));
        assert_eq!(doc.generated_at, "2024-05-01 10:00:00");
        assert_eq!(doc.total_files, 2);

        let rest = &doc.tests["rest_scalability_2r"];
        assert_eq!(rest.protocol, Protocol::Rest);
        assert_eq!(rest.test_type, TestType::Scalability);
        assert_eq!(rest.replicas, 2);
        assert_eq!(rest.vus, 500);
        assert_eq!(rest.stat_values().latency_p50, 0.0);
        assert_eq!(rest.stat_values().latency_mean, 513.1);

        let custom = &doc.tests["custom"];
        assert_eq!(custom.filename, "custom");
        assert_eq!(custom.protocol, Protocol::Grpc);
        assert!(!custom.is_defaulted());
        // 10 * 100 / (0 + 5 + 1)
        assert!((custom.performance_score - 1000.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(DetailedReport::from_json("{not json").is_err());
        assert!(DetailedReport::from_json(r#"{"tests": {"a": {"vus": "many"}}}"#).is_err());
    }
}
