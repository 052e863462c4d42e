//! Core error types for `mapprobe`.

use thiserror::Error;

use crate::models::MetricKind;

/// Core error type for `mapprobe` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Metric name is not part of the catalog.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Metric event kind disagrees with the catalog entry.
    #[error("Metric {name} is a {expected} but the event is a {actual}")]
    MetricKindMismatch {
        /// Metric name.
        name: String,
        /// Kind declared in the catalog.
        expected: MetricKind,
        /// Kind carried by the event.
        actual: MetricKind,
    },

    /// Metric event labels disagree with the catalog entry.
    #[error("Metric {name} expects labels {expected:?}, got {actual:?}")]
    MetricLabelMismatch {
        /// Metric name.
        name: String,
        /// Label names declared in the catalog.
        expected: Vec<String>,
        /// Label names carried by the event.
        actual: Vec<String>,
    },
}
