//! Host APIs for `mapprobe`.
//!
//! - [`http`] - reqwest-backed gateway with tracing and metrics

pub mod http;

// Re-export key types
pub use http::HttpGateway;
