// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `mapprobe` Fetch
//!
//! Outbound HTTP for the `mapprobe` probe.
//!
//! ## Gateway
//!
//! - [`gateway::Gateway`] - One call in, one classified [`RequestOutcome`] out
//! - [`gateway::ApiRequest`] - Method, endpoint, body, token and metric label
//! - [`host::http::HttpGateway`] - reqwest-backed gateway that records metrics
//! - [`endpoint`] - Base URL joining and relative URL resolution
//!
//! ## Retries
//!
//! - [`retry::RetryPolicy`] - Bounded attempts with a fixed interval
//! - [`retry::TokioSleeper`] - Production [`mapprobe_core::Sleeper`]
//!
//! The gateway never retries. Callers decide whether a failure is worth
//! another attempt.
//!
//! ## Example
//!
//! ```ignore
//! use mapprobe_fetch::{ApiRequest, Gateway, HttpGateway};
//!
//! let gateway = HttpGateway::new("https://api.example.com", sink)?;
//! let outcome = gateway.call(ApiRequest::get("/api/map/checkHealth")).await;
//! assert!(outcome.is_success());
//! ```
//!
//! [`RequestOutcome`]: mapprobe_core::RequestOutcome

pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod host;
pub mod retry;

// Re-export key types at crate root
pub use error::FetchError;
pub use gateway::{ApiRequest, Gateway};
pub use host::http::HttpGateway;
pub use retry::{Attempt, RetryOutcome, RetryPolicy, TokioSleeper};

#[cfg(any(test, feature = "test-util"))]
pub use retry::RecordingSleeper;
