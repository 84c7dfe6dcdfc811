use std::io::BufRead;

use protobench_metrics::{
    LatencyStats, error_rate_percent, latency_stats, performance_score, throughput,
};
use tracing::{debug, warn};

use crate::category::RunMetadata;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::event::Event;
use crate::extract::MetricIndex;
use crate::parser::{EventReader, ParseStats, parse_str};

/// All events of one load-test execution, in arrival order.
#[derive(Debug, Clone)]
pub struct Run {
    pub name: String,
    pub events: Vec<Event>,
    pub parse: ParseStats,
    pub metadata: RunMetadata,
}

/// Per-run figures. Computed once; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    pub filename: String,
    /// Number of decoded records, of any kind.
    pub total_metrics: usize,
    pub malformed_lines: usize,
    /// `None` when the run has no latency samples.
    pub latency: Option<LatencyStats>,
    pub throughput_rps: f64,
    pub error_rate_percent: f64,
    pub data_sent_bytes: f64,
    pub data_received_bytes: f64,
    pub performance_score: f64,
}

/// A finalized run: statistics plus classification. Events are gone by now.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedRun {
    pub stats: RunStatistics,
    pub metadata: RunMetadata,
}

impl Run {
    /// Decodes the whole text of a run.
    pub fn from_text(name: impl Into<String>, text: &str, cfg: &AnalysisConfig) -> Self {
        let name = name.into();
        let (events, parse) = parse_str(text, &name, cfg.malformed_log_limit);
        let metadata = cfg.metadata_for(&name);
        Self {
            name,
            events,
            parse,
            metadata,
        }
    }

    /// Streams a run from a reader.
    pub fn from_reader<R: BufRead>(
        name: impl Into<String>,
        reader: R,
        cfg: &AnalysisConfig,
    ) -> Result<Self> {
        let name = name.into();
        let mut stream =
            EventReader::with_log_limit(reader, name.as_str(), cfg.malformed_log_limit);
        let events: Vec<Event> = stream.by_ref().collect();
        let parse = stream.finish()?;
        let metadata = cfg.metadata_for(&name);
        Ok(Self {
            name,
            events,
            parse,
            metadata,
        })
    }

    pub fn statistics(&self, cfg: &AnalysisConfig) -> RunStatistics {
        let names = &cfg.metrics;
        let index = MetricIndex::build(&self.events, &names.all());

        let latency = latency_stats(&index.values(&names.latency));

        let iterations = index.values(&names.iterations);
        let tput = throughput(
            &iterations,
            &index.timestamps(&names.iterations),
            cfg.fallback_window,
        );
        if let Some(reason) = &tput.fallback {
            debug!(
                run = %self.name,
                %reason,
                window_secs = tput.window.as_secs_f64(),
                "throughput window could not be observed; using fallback"
            );
        }

        let error_rate = error_rate_percent(
            &index.values(&names.requests),
            &index.values(&names.failed_requests),
        );

        let p95 = latency.as_ref().map_or(0.0, |l| l.p95);

        RunStatistics {
            filename: self.name.clone(),
            total_metrics: self.events.len(),
            malformed_lines: self.parse.malformed,
            latency,
            throughput_rps: tput.rps,
            error_rate_percent: error_rate,
            data_sent_bytes: index.sum(&names.data_sent),
            data_received_bytes: index.sum(&names.data_received),
            performance_score: performance_score(tput.rps, p95, error_rate),
        }
    }

    /// Folds the events into statistics and drops them.
    pub fn analyze(self, cfg: &AnalysisConfig) -> AnalyzedRun {
        if self.metadata.is_defaulted() {
            let defaulted = &self.metadata.defaulted;
            let fields: Vec<String> = defaulted.iter().map(ToString::to_string).collect();
            warn!(
                run = %self.name,
                defaulted = %fields.join(","),
                "run name does not encode every category field; defaults applied"
            );
        }
        let stats = self.statistics(cfg);
        AnalyzedRun {
            stats,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{Protocol, TestType};
    use std::io::Cursor;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn k6_line(metric: &str, time: &str, value: f64) -> String {
        format!(
            r#"{{"type":"Point","metric":"{metric}","data":{{"time":"{time}","value":{value}}}}}"#
        )
    }

    fn sample_log() -> String {
        [
            r#"{"type":"Metric","data":{"name":"http_req_duration","type":"trend"},"metric":"http_req_duration"}"#
                .to_string(),
            k6_line("http_reqs", "2024-01-01T00:00:00Z", 1.0),
            k6_line("http_req_duration", "2024-01-01T00:00:00Z", 100.0),
            k6_line("http_req_failed", "2024-01-01T00:00:00Z", 0.0),
            k6_line("iterations", "2024-01-01T00:00:00Z", 1.0),
            "this is not json".to_string(),
            k6_line("http_reqs", "2024-01-01T00:00:10Z", 1.0),
            k6_line("http_req_duration", "2024-01-01T00:00:10Z", 200.0),
            k6_line("http_req_failed", "2024-01-01T00:00:10Z", 1.0),
            k6_line("iterations", "2024-01-01T00:00:10Z", 1.0),
            k6_line("data_sent", "2024-01-01T00:00:10Z", 512.0),
            k6_line("data_received", "2024-01-01T00:00:10Z", 2048.0),
        ]
        .join("\n")
    }

    #[test]
    fn statistics_from_k6_log() {
        let cfg = AnalysisConfig::default();
        let run = Run::from_text("rest_monitoring.json", &sample_log(), &cfg);
        let stats = run.statistics(&cfg);

        assert_eq!(stats.filename, "rest_monitoring.json");
        assert_eq!(stats.total_metrics, 11);
        assert_eq!(stats.malformed_lines, 1);

        let l = stats.latency.unwrap_or_else(|| panic!("expected latency"));
        assert!(approx(l.mean, 150.0));
        assert!(approx(l.min, 100.0));
        assert!(approx(l.max, 200.0));

        // 2 iterations over 10s
        assert!(approx(stats.throughput_rps, 0.2));
        assert!(approx(stats.error_rate_percent, 50.0));
        assert!(approx(stats.data_sent_bytes, 512.0));
        assert!(approx(stats.data_received_bytes, 2048.0));
        assert!(stats.performance_score > 0.0);
    }

    #[test]
    fn reader_and_text_agree() {
        let cfg = AnalysisConfig::default();
        let log = sample_log();

        let from_text = Run::from_text("a", &log, &cfg);
        let from_reader = Run::from_reader("a", Cursor::new(log.clone().into_bytes()), &cfg)
            .unwrap_or_else(|e| panic!("from_reader: {e}"));

        assert_eq!(from_text.events, from_reader.events);
        assert_eq!(from_text.parse, from_reader.parse);
        assert_eq!(from_text.statistics(&cfg), from_reader.statistics(&cfg));
    }

    #[test]
    fn unparsable_run_keeps_zeroed_statistics() {
        let cfg = AnalysisConfig::default();
        let run = Run::from_text("grpc_scalability_2r.json", "garbage\n{{{\n", &cfg);
        let analyzed = run.analyze(&cfg);

        assert_eq!(analyzed.stats.total_metrics, 0);
        assert_eq!(analyzed.stats.malformed_lines, 2);
        assert_eq!(analyzed.stats.latency, None);
        assert_eq!(analyzed.stats.throughput_rps, 0.0);
        assert_eq!(analyzed.stats.error_rate_percent, 0.0);
        assert_eq!(analyzed.stats.performance_score, 0.0);
        assert_eq!(analyzed.metadata.key.protocol, Protocol::Grpc);
        assert_eq!(analyzed.metadata.key.test_type, TestType::Scalability);
        assert_eq!(analyzed.metadata.key.replicas, 2);
    }

    #[test]
    fn custom_metric_names_are_honoured() {
        let mut cfg = AnalysisConfig::default();
        cfg.metrics.latency = "grpc_req_duration".to_string();

        let log = [
            k6_line("grpc_req_duration", "2024-01-01T00:00:00Z", 5.0),
            k6_line("http_req_duration", "2024-01-01T00:00:00Z", 500.0),
        ]
        .join("\n");

        let stats = Run::from_text("grpc_monitoring", &log, &cfg).statistics(&cfg);
        let l = stats.latency.unwrap_or_else(|| panic!("expected latency"));
        assert_eq!(l.max, 5.0);
    }

    #[test]
    fn single_iteration_uses_fallback_window() {
        let cfg = AnalysisConfig::default();
        let log = k6_line("iterations", "2024-01-01T00:00:00Z", 30.0);
        let stats = Run::from_text("rest", &log, &cfg).statistics(&cfg);
        assert!(approx(stats.throughput_rps, 0.5));
    }
}
