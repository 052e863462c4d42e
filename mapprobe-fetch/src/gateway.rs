//! Gateway trait and request description.
//!
//! A gateway performs exactly one outbound call per [`Gateway::call`] and
//! classifies the result. Retry policy belongs to the caller.

use async_trait::async_trait;
use mapprobe_core::{HttpMethod, RequestOutcome};
use serde_json::Value;

use crate::endpoint;

// ============================================================================
// Api Request
// ============================================================================

/// Description of one outbound call.
#[derive(Debug, Clone, Copy)]
pub struct ApiRequest<'a> {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Relative endpoint or absolute URL.
    pub endpoint: &'a str,
    /// JSON body for POST requests.
    pub body: Option<&'a Value>,
    /// Bearer token.
    pub token: Option<&'a str>,
    /// Metric label overriding the endpoint-derived default.
    pub label: Option<&'a str>,
}

impl<'a> ApiRequest<'a> {
    /// Creates a GET request.
    pub fn get(endpoint: &'a str) -> Self {
        Self {
            method: HttpMethod::Get,
            endpoint,
            body: None,
            token: None,
            label: None,
        }
    }

    /// Creates a POST request with a JSON body.
    pub fn post(endpoint: &'a str, body: &'a Value) -> Self {
        Self {
            method: HttpMethod::Post,
            endpoint,
            body: Some(body),
            token: None,
            label: None,
        }
    }

    /// Attaches a bearer token.
    pub fn bearer(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    /// Sets the metric label.
    ///
    /// Use this when the endpoint embeds an identifier, so every run reports
    /// under the same label.
    pub fn labeled(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Label reported to the metrics sink.
    pub fn metric_label(&self) -> String {
        match self.label {
            Some(label) => label.to_string(),
            None => endpoint::metric_label(self.endpoint),
        }
    }
}

// ============================================================================
// Gateway Trait
// ============================================================================

/// Performs outbound calls and classifies their outcome.
///
/// Implementations must emit exactly one request-counter event per call.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Performs one call.
    async fn call(&self, request: ApiRequest<'_>) -> RequestOutcome;

    /// Base URL relative endpoints are joined to.
    fn base_url(&self) -> &str;
}
