// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `mapprobe` Workflow
//!
//! The probe itself: a session, the steps that drive the map-delivery API,
//! and the pipeline that runs them in order.
//!
//! ## Architecture
//!
//! ```text
//! ProbePipeline
//!   └── ProbeStep (login, discovery, import, ..., health check)
//!         ├── ProbeContext (gateway, metrics sink, sleeper, settings)
//!         └── Session (device id, token, import id, download URL)
//! ```
//!
//! Each run starts from a fresh [`Session`]. The first failing step ends the
//! run; the failure is logged, counted under
//! `getapp_test_failures_total{test_name, failure_reason}` and returned in the
//! [`RunReport`].
//!
//! ## Example
//!
//! ```ignore
//! use mapprobe_workflow::{ProbeContext, ProbePipeline};
//!
//! let ctx = ProbeContext::new(gateway, sink).with_settings(settings);
//! let report = ProbePipeline::full().run(&ctx).await;
//! println!("{:?}", report.outcome);
//! ```

pub mod context;
pub mod error;
pub mod payloads;
pub mod pipeline;
pub mod session;
pub mod step;
pub mod steps;

#[cfg(test)]
mod testing;

// Re-export key types at crate root
pub use context::{Credentials, ProbeContext, WorkflowSettings};
pub use error::StepError;
pub use pipeline::{ProbePipeline, RunOutcome, RunReport, StepRecord};
pub use session::Session;
pub use step::{ProbeStep, StepId};
