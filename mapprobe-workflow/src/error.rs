//! Step error types.

use mapprobe_core::{RequestOutcome, TransportKind};
use thiserror::Error;

// ============================================================================
// Step Error
// ============================================================================

/// Why a step failed.
///
/// Every variant maps to a stable [`StepError::reason`] label that the
/// pipeline reports as `failure_reason`.
#[derive(Debug, Error)]
pub enum StepError {
    /// Username or password is not configured. An authentication failure
    /// that never reaches the network.
    #[error("Authentication failed: username and password are required")]
    MissingCredentials,

    /// The login call did not succeed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The call never produced an HTTP status.
    #[error("Transport error ({kind}): {message}")]
    Transport {
        /// Failure category.
        kind: TransportKind,
        /// Transport error text.
        message: String,
    },

    /// The API answered 4xx.
    #[error("Client error: HTTP {status}")]
    ClientProtocol {
        /// Status code.
        status: u16,
    },

    /// The API answered 5xx.
    #[error("Server error: HTTP {status}")]
    ServerProtocol {
        /// Status code.
        status: u16,
    },

    /// A field the step needs is absent from the response body.
    #[error("Response is missing '{field}'")]
    DataExtraction {
        /// JSON field name.
        field: &'static str,
    },

    /// No import request id in the session.
    #[error("No import request id in session")]
    MissingImportId,

    /// The import reached the `Error` status.
    #[error("Import finished with status Error")]
    ImportFailed,

    /// The import never reached a terminal status.
    #[error("Import status still pending after {attempts} attempts")]
    RetryBudgetExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// At least one asset failed to download.
    #[error("Download failed for: {}", failed.join(", "))]
    DownloadFailed {
        /// File types that failed.
        failed: Vec<String>,
    },

    /// At least one health endpoint failed.
    #[error("Unhealthy endpoints: {}", endpoints.join(", "))]
    Unhealthy {
        /// Endpoints that failed.
        endpoints: Vec<String>,
    },

    /// A response body could not be decoded.
    #[error("Invalid response payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl StepError {
    /// Maps a non-success outcome to an error.
    ///
    /// Returns `None` for [`RequestOutcome::Success`].
    pub fn from_outcome(outcome: &RequestOutcome) -> Option<Self> {
        match outcome {
            RequestOutcome::Success { .. } => None,
            RequestOutcome::ClientError { status_code } => Some(Self::ClientProtocol {
                status: *status_code,
            }),
            RequestOutcome::ServerError { status_code } => Some(Self::ServerProtocol {
                status: *status_code,
            }),
            RequestOutcome::TransportError { kind, message } => Some(Self::Transport {
                kind: *kind,
                message: message.clone(),
            }),
        }
    }

    /// Returns true for both authentication failures, with or without a
    /// login call.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::Authentication(_))
    }

    /// Stable label for the `failure_reason` metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::Authentication(_) => "auth_failed",
            Self::Transport { .. } => "transport_error",
            Self::ClientProtocol { .. } => "client_error",
            Self::ServerProtocol { .. } => "server_error",
            Self::DataExtraction { .. } => "missing_field",
            Self::MissingImportId => "no_request_id",
            Self::ImportFailed => "import_failed",
            Self::RetryBudgetExhausted { .. } => "retry_exhausted",
            Self::DownloadFailed { .. } => "download_failed",
            Self::Unhealthy { .. } => "unhealthy",
            Self::Payload(_) => "payload_error",
        }
    }
}

/// Returns the body of a successful outcome or the matching error.
pub(crate) fn success_body(outcome: RequestOutcome) -> Result<Vec<u8>, StepError> {
    match outcome {
        RequestOutcome::Success { body, .. } => Ok(body),
        RequestOutcome::ClientError { status_code } => {
            Err(StepError::ClientProtocol { status: status_code })
        }
        RequestOutcome::ServerError { status_code } => {
            Err(StepError::ServerProtocol { status: status_code })
        }
        RequestOutcome::TransportError { kind, message } => {
            Err(StepError::Transport { kind, message })
        }
    }
}
