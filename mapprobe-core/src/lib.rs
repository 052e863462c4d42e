// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `mapprobe` Core
//!
//! Core types, the metric catalog, and trait definitions shared by every
//! `mapprobe` crate.
//!
//! The probe drives the GetApp map-delivery API end to end and exports the
//! result as metrics. This crate holds the pieces that have no transport or
//! runtime dependency:
//!
//! ## Key Types
//!
//! ### Request Outcomes
//! - [`RequestOutcome`] - Classified result of one outbound HTTP call
//! - [`TransportKind`] - Network-level failure categories
//! - [`HttpMethod`] - The two verbs the probe uses
//!
//! ### Import Tracking
//! - [`ImportStatus`] - Remote status of a map-import transaction
//!
//! ### Metrics
//! - [`MetricEvent`] - One write-only metric observation
//! - [`MetricKind`] - Counter, gauge or histogram
//! - [`MetricDescriptor`] - Catalog entry for a metric family
//! - [`METRIC_CATALOG`] - Every metric the probe can emit
//!
//! ### Traits
//! - [`MetricsSink`] - Where metric events go
//! - [`Sleeper`] - Injectable fixed-duration waits

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Outcomes
    HttpMethod,
    RequestOutcome,
    TransportKind,
    // Import tracking
    ImportStatus,
    // Metrics
    METRIC_CATALOG,
    MetricDescriptor,
    MetricEvent,
    MetricKind,
    metric_names,
};

// Re-export traits
pub use traits::{MetricsSink, Sleeper};
