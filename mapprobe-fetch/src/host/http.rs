//! reqwest-backed gateway with tracing and metrics.
//!
//! This module provides the production [`Gateway`]. Each call:
//! - resolves the endpoint against the base URL
//! - attaches JSON headers and the bearer token
//! - classifies the response into a [`RequestOutcome`]
//! - records request, latency, size and failure metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mapprobe_core::{HttpMethod, MetricEvent, MetricsSink, RequestOutcome, TransportKind};
use reqwest::{Client, header};
use tracing::{debug, error, info, instrument};

use crate::endpoint;
use crate::error::FetchError;
use crate::gateway::{ApiRequest, Gateway};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for mapprobe.
const USER_AGENT: &str = concat!("mapprobe/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Gateway
// ============================================================================

/// Gateway over a shared reqwest client.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Client,
    base_url: String,
    metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpGateway {
    /// Creates a gateway with the default timeout.
    ///
    /// # Errors
    ///
    /// Fails if the base URL is invalid or the client cannot be built.
    pub fn new(base_url: &str, metrics: Arc<dyn MetricsSink>) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, metrics, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a gateway with a custom timeout.
    ///
    /// # Errors
    ///
    /// Fails if the base URL is invalid or the client cannot be built. The
    /// latter only happens with a broken TLS configuration.
    pub fn with_timeout(
        base_url: &str,
        metrics: Arc<dyn MetricsSink>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let base_url = endpoint::normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: client,
            base_url,
            metrics,
        })
    }

    /// Sends the request and classifies the response.
    async fn send(&self, request: &ApiRequest<'_>, url: &str) -> RequestOutcome {
        let mut builder = match request.method {
            HttpMethod::Get => self.inner.get(url),
            HttpMethod::Post => self.inner.post(url),
        }
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json");

        if let Some(token) = request.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return transport_error(&e),
        };

        let status = response.status();
        debug!(status = %status, "Response received");

        if !status.is_success() {
            return RequestOutcome::from_status(status.as_u16(), Vec::new());
        }

        match response.bytes().await {
            Ok(bytes) => RequestOutcome::from_status(status.as_u16(), bytes.to_vec()),
            Err(e) => transport_error(&e),
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip(self, request), fields(method = %request.method, endpoint = %request.endpoint))]
    async fn call(&self, request: ApiRequest<'_>) -> RequestOutcome {
        let url = endpoint::resolve(&self.base_url, request.endpoint);
        let label = request.metric_label();
        info!(url = %url, "Making {} request", request.method);

        self.metrics.record(MetricEvent::active_requests(1.0));
        let start = Instant::now();

        let outcome = self.send(&request, &url).await;

        let mut events = vec![
            MetricEvent::request(&label, request.method.as_str(), outcome.label()),
            MetricEvent::request_duration(&label, start.elapsed().as_secs_f64()),
        ];
        if let (HttpMethod::Post, Some(body)) = (request.method, request.body) {
            events.push(MetricEvent::request_size(body.to_string().len()));
        }
        if let Some(error_type) = outcome.error_type() {
            events.push(MetricEvent::failed_request(
                &label,
                outcome.status_code().unwrap_or(0),
                error_type,
            ));
            error!(url = %url, outcome = %outcome, "Request failed");
        } else {
            info!(url = %url, outcome = %outcome, "Request succeeded");
        }
        events.push(MetricEvent::active_requests(-1.0));
        self.metrics.record_all(events);

        outcome
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Maps a reqwest failure onto a transport outcome.
fn transport_error(err: &reqwest::Error) -> RequestOutcome {
    RequestOutcome::TransportError {
        kind: transport_kind(err),
        message: err.to_string(),
    }
}

fn transport_kind(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_body() {
        TransportKind::Body
    } else if err.is_decode() {
        TransportKind::Decode
    } else if err.is_request() || err.is_builder() || err.is_redirect() {
        TransportKind::Request
    } else {
        TransportKind::Other
    }
}

// ============================================================================
// Tests
// ============================================================================
