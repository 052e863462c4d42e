//! Domain models for `mapprobe`.
//!
//! ## Submodules
//!
//! - [`outcome`] - Request outcomes (RequestOutcome, TransportKind, HttpMethod)
//! - [`import`] - Import transaction status (ImportStatus)
//! - [`metric`] - Metric events and the metric catalog

mod import;
mod metric;
mod outcome;

// Re-export everything at the models level
pub use import::ImportStatus;
pub use metric::{METRIC_CATALOG, MetricDescriptor, MetricEvent, MetricKind, names as metric_names};
pub use outcome::{HttpMethod, RequestOutcome, TransportKind};
#[cfg(test)]
mod serde_tests;
