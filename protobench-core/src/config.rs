use std::collections::HashSet;
use std::time::Duration;

use protobench_metrics::DEFAULT_FALLBACK_WINDOW;

use crate::category::{RunMetadata, RunOverride};
use crate::error::{Error, Result};
use crate::parser::DEFAULT_MALFORMED_LOG_LIMIT;

/// Metric names looked up in the event stream.
///
/// Defaults follow k6's built-in HTTP metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNames {
    pub latency: String,
    pub requests: String,
    pub failed_requests: String,
    pub iterations: String,
    pub data_sent: String,
    pub data_received: String,
}

impl Default for MetricNames {
    fn default() -> Self {
        Self {
            latency: "http_req_duration".to_string(),
            requests: "http_reqs".to_string(),
            failed_requests: "http_req_failed".to_string(),
            iterations: "iterations".to_string(),
            data_sent: "data_sent".to_string(),
            data_received: "data_received".to_string(),
        }
    }
}

impl MetricNames {
    pub fn all(&self) -> [&str; 6] {
        [
            &self.latency,
            &self.requests,
            &self.failed_requests,
            &self.iterations,
            &self.data_sent,
            &self.data_received,
        ]
    }

    fn validate(&self) -> Result<()> {
        let named = [
            ("latency", &self.latency),
            ("requests", &self.requests),
            ("failedRequests", &self.failed_requests),
            ("iterations", &self.iterations),
            ("dataSent", &self.data_sent),
            ("dataReceived", &self.data_received),
        ];
        for (field, name) in named {
            if name.trim().is_empty() {
                return Err(Error::EmptyMetricName(field));
            }
        }
        Ok(())
    }
}

/// Settings that shape how runs are parsed, classified and measured.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub metrics: MetricNames,
    /// Window used when the observation span cannot be derived from timestamps.
    pub fallback_window: Duration,
    pub malformed_log_limit: usize,
    pub overrides: Vec<RunOverride>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            metrics: MetricNames::default(),
            fallback_window: DEFAULT_FALLBACK_WINDOW,
            malformed_log_limit: DEFAULT_MALFORMED_LOG_LIMIT,
            overrides: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fallback_window.is_zero() {
            return Err(Error::InvalidFallbackWindow);
        }

        self.metrics.validate()?;

        let mut seen = HashSet::new();
        for o in &self.overrides {
            if o.name.trim().is_empty() {
                return Err(Error::EmptyOverrideName);
            }
            if o.vus == Some(0) {
                return Err(Error::InvalidVus(o.name.clone()));
            }
            if o.replicas == Some(0) {
                return Err(Error::InvalidReplicas(o.name.clone()));
            }
            if !seen.insert(o.name.as_str()) {
                return Err(Error::DuplicateOverride(o.name.clone()));
            }
        }

        Ok(())
    }

    pub fn override_for(&self, run_name: &str) -> Option<&RunOverride> {
        self.overrides.iter().find(|o| o.name == run_name)
    }

    /// Metadata for a run, combining any configured override with the naming convention.
    pub fn metadata_for(&self, run_name: &str) -> RunMetadata {
        RunMetadata::resolve(run_name, self.override_for(run_name))
    }
}
