//! Classified outcomes of outbound HTTP calls.
//!
//! Every gateway call ends in exactly one [`RequestOutcome`]. Callers match on
//! the variant instead of inferring failure categories from missing values.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// HTTP Method
// ============================================================================

/// HTTP verbs used by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request with an optional JSON body.
    Post,
}

impl HttpMethod {
    /// Returns the canonical verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Transport Kind
// ============================================================================

/// Network-level failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// The request or connect phase timed out.
    Timeout,
    /// DNS failure, refused or reset connection.
    Connect,
    /// The request could not be built or sent.
    Request,
    /// Reading the response body failed.
    Body,
    /// The response could not be decoded.
    Decode,
    /// The server answered with a status outside 2xx/4xx/5xx.
    UnexpectedStatus,
    /// Anything else the transport reported.
    Other,
}

impl TransportKind {
    /// Returns the label used in metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::UnexpectedStatus => "unexpected_status",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Request Outcome
// ============================================================================

/// The classified result of one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// 2xx response.
    Success {
        /// HTTP status code.
        status_code: u16,
        /// Raw response body.
        body: Vec<u8>,
    },
    /// 4xx response.
    ClientError {
        /// HTTP status code.
        status_code: u16,
    },
    /// 5xx response.
    ServerError {
        /// HTTP status code.
        status_code: u16,
    },
    /// The call never produced a usable HTTP status.
    TransportError {
        /// Failure category.
        kind: TransportKind,
        /// Human-readable cause from the transport.
        message: String,
    },
}

impl RequestOutcome {
    /// Classifies a status code and body.
    ///
    /// Codes outside 2xx/4xx/5xx become a transport error of kind
    /// [`TransportKind::UnexpectedStatus`].
    pub fn from_status(status_code: u16, body: Vec<u8>) -> Self {
        match status_code {
            200..=299 => Self::Success { status_code, body },
            400..=499 => Self::ClientError { status_code },
            500..=599 => Self::ServerError { status_code },
            other => Self::TransportError {
                kind: TransportKind::UnexpectedStatus,
                message: format!("unexpected HTTP status {other}"),
            },
        }
    }

    /// Returns true for 2xx responses.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the HTTP status code, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. }
            | Self::ClientError { status_code }
            | Self::ServerError { status_code } => Some(*status_code),
            Self::TransportError { .. } => None,
        }
    }

    /// Returns the response body for successful calls.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Decodes the body of a successful call as JSON.
    ///
    /// Returns `None` for non-success outcomes.
    pub fn json<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.body().map(serde_json::from_slice)
    }

    /// Outcome label used by the request counter.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::ClientError { .. } => "client_error",
            Self::ServerError { .. } => "server_error",
            Self::TransportError { .. } => "transport_error",
        }
    }

    /// Error type label used by the failed-requests counter.
    ///
    /// Returns `None` for successful calls.
    pub fn error_type(&self) -> Option<&'static str> {
        match self {
            Self::Success { .. } => None,
            Self::ClientError { .. } => Some("client_error"),
            Self::ServerError { .. } => Some("server_error"),
            Self::TransportError { kind, .. } => Some(kind.as_str()),
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status_code, .. } => write!(f, "HTTP {status_code}"),
            Self::ClientError { status_code } => write!(f, "client error HTTP {status_code}"),
            Self::ServerError { status_code } => write!(f, "server error HTTP {status_code}"),
            Self::TransportError { kind, message } => {
                write!(f, "transport error ({kind}): {message}")
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
