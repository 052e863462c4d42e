//! HTTP exporter for the Prometheus registry.
//!
//! Routes:
//! - `GET /metrics` - text exposition
//! - `GET /health` - liveness document

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::MetricsError;
use crate::prometheus_sink::PrometheusSink;

/// Content type of the Prometheus text format.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Builds the exporter router.
pub fn router(sink: Arc<PrometheusSink>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(sink)
}

/// Binds `addr` and serves until the server fails.
///
/// # Errors
///
/// Fails if the address cannot be bound or the server stops with an I/O
/// error.
pub async fn serve(addr: SocketAddr, sink: Arc<PrometheusSink>) -> Result<(), MetricsError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| MetricsError::Bind { addr, source })?;
    info!("Metrics server listening on {}", addr);
    serve_on(listener, sink).await
}

/// Serves on an already bound listener.
///
/// # Errors
///
/// Fails if the server stops with an I/O error.
pub async fn serve_on(listener: TcpListener, sink: Arc<PrometheusSink>) -> Result<(), MetricsError> {
    axum::serve(listener, router(sink))
        .await
        .map_err(MetricsError::Serve)
}

async fn metrics(State(sink): State<Arc<PrometheusSink>>) -> Response {
    match sink.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
