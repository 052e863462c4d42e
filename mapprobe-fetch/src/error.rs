//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Fetch Error
// ============================================================================

/// Error type for gateway construction.
///
/// Calls themselves never fail with this type; they always produce a
/// [`mapprobe_core::RequestOutcome`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// The base URL is not an absolute http(s) URL.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}
