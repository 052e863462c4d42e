// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `mapprobe` Metrics
//!
//! Implementations of [`mapprobe_core::MetricsSink`] and the HTTP exporter.
//!
//! - [`PrometheusSink`] - Registers every catalog family up front and applies
//!   events to it
//! - [`RecordingSink`] - Keeps events in memory, for tests and one-shot runs
//! - [`exporter`] - axum server for `GET /metrics` and `GET /health`

pub mod error;
pub mod exporter;
pub mod prometheus_sink;
pub mod recording;

// Re-export key types at crate root
pub use error::MetricsError;
pub use exporter::{router, serve, serve_on};
pub use prometheus_sink::PrometheusSink;
pub use recording::RecordingSink;
