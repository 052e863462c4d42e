//! Probe context shared by all steps.
//!
//! The context bundles the capabilities a step may use: the gateway for
//! outbound calls, the metrics sink, and the sleeper for fixed waits. It
//! also carries the settings that stay constant across runs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mapprobe_core::{MetricsSink, Sleeper};
use mapprobe_fetch::{Gateway, RetryPolicy, TokioSleeper};

/// Subsystem health endpoints, checked in this order.
pub const HEALTH_ENDPOINTS: [&str; 4] = [
    "/api/delivery/checkHealth",
    "/api/device/checkHealth",
    "/api/offering/checkHealth",
    "/api/map/checkHealth",
];

/// Status label of every download-status report.
pub const DELIVERY_STATUS_START: &str = "Start";

// ============================================================================
// Credentials
// ============================================================================

/// Login credentials. Empty strings count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    /// Creates credentials from optional parts.
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username: username.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.is_empty()),
        }
    }

    /// Returns both parts if both are set.
    pub fn pair(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// Workflow Settings
// ============================================================================

/// Settings that stay constant across runs.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Login credentials.
    pub credentials: Credentials,
    /// Import status polling budget.
    pub status_poll: RetryPolicy,
    /// Best-effort repeated status updates after download.
    pub status_updates: RetryPolicy,
    /// Health endpoints, in check order.
    pub health_endpoints: Vec<String>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            status_poll: RetryPolicy::status_poll(),
            status_updates: RetryPolicy::new(5, Duration::from_secs(2)),
            health_endpoints: HEALTH_ENDPOINTS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl WorkflowSettings {
    /// Sets the credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

// ============================================================================
// Probe Context
// ============================================================================

/// Context passed to every step.
pub struct ProbeContext {
    /// Outbound calls.
    pub gateway: Arc<dyn Gateway>,
    /// Metric events.
    pub metrics: Arc<dyn MetricsSink>,
    /// Fixed waits.
    pub sleeper: Arc<dyn Sleeper>,
    /// Constant settings.
    pub settings: WorkflowSettings,
}

impl ProbeContext {
    /// Creates a context with default settings and the tokio sleeper.
    pub fn new(gateway: Arc<dyn Gateway>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            gateway,
            metrics,
            sleeper: Arc::new(TokioSleeper),
            settings: WorkflowSettings::default(),
        }
    }

    /// Replaces the sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replaces the settings.
    pub fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl fmt::Debug for ProbeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeContext")
            .field("base_url", &self.gateway.base_url())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
