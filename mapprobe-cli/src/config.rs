//! Probe configuration assembled from flags and environment.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use mapprobe_core::MetricsSink;
use mapprobe_fetch::{FetchError, HttpGateway, endpoint};
use mapprobe_workflow::{Credentials, ProbeContext, WorkflowSettings};
use thiserror::Error;

use crate::Cli;
use crate::scheduler::Schedule;

/// Default GetApp deployment.
pub const DEFAULT_BASE_URL: &str = "https://api-getapp-dev.apps.sr.eastus.aroapp.io";

/// Default cron schedule: every five minutes.
pub const DEFAULT_SCHEDULE: &str = "*/5 * * * *";

/// Default metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 8000;

/// Configuration errors. All of them are fatal before any run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The cron expression or interval cannot be scheduled.
    #[error("Invalid schedule '{expression}': {message}")]
    InvalidSchedule {
        /// The rejected expression.
        expression: String,
        /// Why it was rejected.
        message: String,
    },

    /// The base URL is not an absolute http(s) URL.
    #[error(transparent)]
    InvalidBaseUrl(#[from] FetchError),
}

/// Validated probe configuration.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// API base URL without trailing slash.
    pub base_url: String,
    /// Login credentials.
    pub credentials: Credentials,
    /// When runs start.
    pub schedule: Schedule,
    /// Where the exporter listens.
    pub metrics_addr: SocketAddr,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ProbeConfig {
    /// Validates the parsed command line.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let base_url = endpoint::normalize_base_url(&cli.base_url)?;
        let schedule = match cli.interval_secs {
            Some(secs) => Schedule::interval(secs)?,
            None => Schedule::parse(&cli.schedule)?,
        };

        Ok(Self {
            base_url,
            credentials: Credentials::new(cli.username.clone(), cli.password.clone()),
            schedule,
            metrics_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, cli.metrics_port)),
            request_timeout: Duration::from_secs(cli.timeout_secs),
        })
    }

    /// Builds the probe context on top of a real HTTP gateway.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn context(&self, sink: Arc<dyn MetricsSink>) -> Result<ProbeContext, FetchError> {
        let gateway = HttpGateway::with_timeout(&self.base_url, sink.clone(), self.request_timeout)?;
        let settings = WorkflowSettings::default().with_credentials(self.credentials.clone());
        Ok(ProbeContext::new(Arc::new(gateway), sink).with_settings(settings))
    }
}
