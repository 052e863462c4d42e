//! Metrics error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors from building the registry or serving it.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Family registration failed.
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The text exposition was not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// The exporter could not bind its listener.
    #[error("Failed to bind metrics server to {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The exporter stopped with an I/O error.
    #[error("Metrics server error: {0}")]
    Serve(#[source] std::io::Error),
}
