//! Metric events and the metric catalog.
//!
//! Components never touch a metrics backend directly. They build a
//! [`MetricEvent`] and hand it to a [`crate::MetricsSink`]. Every name an
//! event may carry is declared once in [`METRIC_CATALOG`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;

// ============================================================================
// Metric Names
// ============================================================================

/// Metric family names.
pub mod names {
    /// Requests by endpoint, method and outcome.
    pub const REQUESTS_TOTAL: &str = "getapp_requests_total";
    /// Request latency by endpoint.
    pub const REQUEST_DURATION_SECONDS: &str = "getapp_request_duration_seconds";
    /// Requests currently in flight.
    pub const ACTIVE_REQUESTS: &str = "getapp_active_requests";
    /// JSON request body size.
    pub const REQUEST_SIZE_BYTES: &str = "getapp_request_size_bytes";
    /// Non-success requests by endpoint, status code and error type.
    pub const FAILED_REQUESTS_TOTAL: &str = "getapp_failed_requests_total";
    /// Step failures by step and reason.
    pub const TEST_FAILURES_TOTAL: &str = "getapp_test_failures_total";
    /// Failed asset downloads by file type.
    pub const DOWNLOAD_FAILURES_TOTAL: &str = "getapp_download_failures_total";
    /// Asset downloads by file type and outcome.
    pub const DOWNLOADS_TOTAL: &str = "getapp_downloads_total";
    /// Unexpected import status values.
    pub const IMPORT_STATUS_FAILURES: &str = "getapp_import_status_failures";
    /// Failed subsystem health endpoints.
    pub const HEALTH_CHECK_FAILURES_TOTAL: &str = "getapp_health_check_failures_total";
    /// Pipeline runs by terminal outcome.
    pub const RUNS_TOTAL: &str = "getapp_runs_total";
    /// Pipeline run duration.
    pub const RUN_DURATION_SECONDS: &str = "getapp_run_duration_seconds";
}

// ============================================================================
// Metric Kind
// ============================================================================

/// The kind of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Monotonic counter; the event value is the increment.
    Counter,
    /// Up/down gauge; the event value is a signed delta.
    Gauge,
    /// Distribution; the event value is one observation.
    Histogram,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        })
    }
}

// ============================================================================
// Metric Catalog
// ============================================================================

/// Declaration of one metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDescriptor {
    /// Family name.
    pub name: &'static str,
    /// Help text shown in the exposition.
    pub help: &'static str,
    /// Family kind.
    pub kind: MetricKind,
    /// Label names in exposition order.
    pub labels: &'static [&'static str],
}

impl MetricDescriptor {
    /// Looks up a descriptor by family name.
    pub fn find(name: &str) -> Option<&'static MetricDescriptor> {
        METRIC_CATALOG.iter().find(|d| d.name == name)
    }
}

/// Every metric family the probe emits.
pub const METRIC_CATALOG: &[MetricDescriptor] = &[
    MetricDescriptor {
        name: names::REQUESTS_TOTAL,
        help: "Total API requests",
        kind: MetricKind::Counter,
        labels: &["endpoint", "method", "outcome"],
    },
    MetricDescriptor {
        name: names::REQUEST_DURATION_SECONDS,
        help: "Request latency in seconds",
        kind: MetricKind::Histogram,
        labels: &["endpoint"],
    },
    MetricDescriptor {
        name: names::ACTIVE_REQUESTS,
        help: "Number of active requests",
        kind: MetricKind::Gauge,
        labels: &[],
    },
    MetricDescriptor {
        name: names::REQUEST_SIZE_BYTES,
        help: "Request size in bytes",
        kind: MetricKind::Histogram,
        labels: &[],
    },
    MetricDescriptor {
        name: names::FAILED_REQUESTS_TOTAL,
        help: "Total failed requests",
        kind: MetricKind::Counter,
        labels: &["endpoint", "status_code", "error_type"],
    },
    MetricDescriptor {
        name: names::TEST_FAILURES_TOTAL,
        help: "Total test failures",
        kind: MetricKind::Counter,
        labels: &["test_name", "failure_reason"],
    },
    MetricDescriptor {
        name: names::DOWNLOAD_FAILURES_TOTAL,
        help: "Download failures",
        kind: MetricKind::Counter,
        labels: &["file_type"],
    },
    MetricDescriptor {
        name: names::DOWNLOADS_TOTAL,
        help: "Asset downloads by outcome",
        kind: MetricKind::Counter,
        labels: &["file_type", "outcome"],
    },
    MetricDescriptor {
        name: names::IMPORT_STATUS_FAILURES,
        help: "Import status failures",
        kind: MetricKind::Counter,
        labels: &["status"],
    },
    MetricDescriptor {
        name: names::HEALTH_CHECK_FAILURES_TOTAL,
        help: "Failed subsystem health checks",
        kind: MetricKind::Counter,
        labels: &["endpoint"],
    },
    MetricDescriptor {
        name: names::RUNS_TOTAL,
        help: "Probe runs by outcome",
        kind: MetricKind::Counter,
        labels: &["outcome"],
    },
    MetricDescriptor {
        name: names::RUN_DURATION_SECONDS,
        help: "Probe run duration in seconds",
        kind: MetricKind::Histogram,
        labels: &[],
    },
];

// ============================================================================
// Metric Event
// ============================================================================

/// One metric observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
    /// Family name (see [`names`]).
    pub name: String,
    /// Label values keyed by label name.
    pub labels: BTreeMap<String, String>,
    /// Family kind.
    pub kind: MetricKind,
    /// Increment, delta or observation depending on `kind`.
    pub value: f64,
}

impl MetricEvent {
    /// Creates an event from raw parts.
    pub fn new<const N: usize>(
        name: &str,
        kind: MetricKind,
        labels: [(&str, &str); N],
        value: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            kind,
            value,
        }
    }

    /// One classified request.
    pub fn request(endpoint: &str, method: &str, outcome: &str) -> Self {
        Self::new(
            names::REQUESTS_TOTAL,
            MetricKind::Counter,
            [("endpoint", endpoint), ("method", method), ("outcome", outcome)],
            1.0,
        )
    }

    /// Request latency observation.
    pub fn request_duration(endpoint: &str, seconds: f64) -> Self {
        Self::new(
            names::REQUEST_DURATION_SECONDS,
            MetricKind::Histogram,
            [("endpoint", endpoint)],
            seconds,
        )
    }

    /// In-flight request delta (`+1.0` on send, `-1.0` on completion).
    pub fn active_requests(delta: f64) -> Self {
        Self::new(names::ACTIVE_REQUESTS, MetricKind::Gauge, [], delta)
    }

    /// Request body size observation.
    #[allow(clippy::cast_precision_loss)]
    pub fn request_size(bytes: usize) -> Self {
        Self::new(
            names::REQUEST_SIZE_BYTES,
            MetricKind::Histogram,
            [],
            bytes as f64,
        )
    }

    /// One non-success request.
    pub fn failed_request(endpoint: &str, status_code: u16, error_type: &str) -> Self {
        Self::new(
            names::FAILED_REQUESTS_TOTAL,
            MetricKind::Counter,
            [
                ("endpoint", endpoint),
                ("status_code", &status_code.to_string()),
                ("error_type", error_type),
            ],
            1.0,
        )
    }

    /// One failed pipeline step.
    pub fn test_failure(test_name: &str, failure_reason: &str) -> Self {
        Self::new(
            names::TEST_FAILURES_TOTAL,
            MetricKind::Counter,
            [("test_name", test_name), ("failure_reason", failure_reason)],
            1.0,
        )
    }

    /// One asset download attempt.
    pub fn download(file_type: &str, success: bool) -> Self {
        let outcome = if success { "success" } else { "failure" };
        Self::new(
            names::DOWNLOADS_TOTAL,
            MetricKind::Counter,
            [("file_type", file_type), ("outcome", outcome)],
            1.0,
        )
    }

    /// One failed asset download.
    pub fn download_failure(file_type: &str) -> Self {
        Self::new(
            names::DOWNLOAD_FAILURES_TOTAL,
            MetricKind::Counter,
            [("file_type", file_type)],
            1.0,
        )
    }

    /// One unexpected import status value.
    pub fn import_status_anomaly(status: &str) -> Self {
        Self::new(
            names::IMPORT_STATUS_FAILURES,
            MetricKind::Counter,
            [("status", status)],
            1.0,
        )
    }

    /// One failed health endpoint.
    pub fn health_check_failure(endpoint: &str) -> Self {
        Self::new(
            names::HEALTH_CHECK_FAILURES_TOTAL,
            MetricKind::Counter,
            [("endpoint", endpoint)],
            1.0,
        )
    }

    /// One finished run.
    pub fn run(outcome: &str) -> Self {
        Self::new(
            names::RUNS_TOTAL,
            MetricKind::Counter,
            [("outcome", outcome)],
            1.0,
        )
    }

    /// Run duration observation.
    pub fn run_duration(seconds: f64) -> Self {
        Self::new(
            names::RUN_DURATION_SECONDS,
            MetricKind::Histogram,
            [],
            seconds,
        )
    }

    /// Returns a label value.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Checks the event against the catalog.
    ///
    /// # Errors
    ///
    /// Fails if the name is unknown or the kind or label set disagree with
    /// the catalog entry.
    pub fn validate(&self) -> Result<&'static MetricDescriptor, CoreError> {
        let descriptor = MetricDescriptor::find(&self.name)
            .ok_or_else(|| CoreError::UnknownMetric(self.name.clone()))?;

        if descriptor.kind != self.kind {
            return Err(CoreError::MetricKindMismatch {
                name: self.name.clone(),
                expected: descriptor.kind,
                actual: self.kind,
            });
        }

        let labels_match = descriptor.labels.len() == self.labels.len()
            && descriptor.labels.iter().all(|l| self.labels.contains_key(*l));
        if !labels_match {
            return Err(CoreError::MetricLabelMismatch {
                name: self.name.clone(),
                expected: descriptor.labels.iter().map(ToString::to_string).collect(),
                actual: self.labels.keys().cloned().collect(),
            });
        }

        Ok(descriptor)
    }

    /// Label values ordered as the catalog declares them.
    pub fn ordered_label_values(&self, descriptor: &MetricDescriptor) -> Vec<&str> {
        descriptor
            .labels
            .iter()
            .map(|l| self.label(l).unwrap_or_default())
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
