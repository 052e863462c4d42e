//! Step trait and identifiers.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ProbeContext;
use crate::error::StepError;
use crate::session::Session;

// ============================================================================
// Step Id
// ============================================================================

/// Identifier of a pipeline step, also its `test_name` metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Obtain a bearer token.
    Login,
    /// Announce the synthetic device.
    Discovery,
    /// Create a map import.
    ImportMap,
    /// Poll the import until it is terminal.
    ImportStatus,
    /// Report the download start right after the import is created.
    UpdateDownloadStatus,
    /// Best-effort status report once the import is terminal.
    PostImportDownloadStatus,
    /// Prepare the delivery and fetch its URL.
    PrepareDelivery,
    /// Download the asset pair.
    DownloadFiles,
    /// Best-effort repeated status reports.
    RepeatDownloadStatus,
    /// Report the delivered map in the inventory.
    UpdateInventory,
    /// Check every subsystem health endpoint.
    HealthCheck,
}

impl StepId {
    /// Label value for this step.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Discovery => "discovery",
            Self::ImportMap => "import_map",
            Self::ImportStatus => "import_status",
            Self::UpdateDownloadStatus => "update_download_status",
            Self::PostImportDownloadStatus => "post_import_download_status",
            Self::PrepareDelivery => "prepare_delivery",
            Self::DownloadFiles => "download_files",
            Self::RepeatDownloadStatus => "repeat_download_status",
            Self::UpdateInventory => "update_inventory",
            Self::HealthCheck => "health_check",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Probe Step Trait
// ============================================================================

/// One stage of a pipeline run.
///
/// A step reads and updates the session, calls the gateway through the
/// context, and returns `Ok(())` to let the run continue.
///
/// ```ignore
/// struct Ping;
///
/// #[async_trait]
/// impl ProbeStep for Ping {
///     fn id(&self) -> StepId {
///         StepId::HealthCheck
///     }
///
///     async fn execute(&self, ctx: &ProbeContext, _session: &mut Session) -> Result<(), StepError> {
///         let outcome = ctx.gateway.call(ApiRequest::get("/api/map/checkHealth")).await;
///         success_body(outcome).map(drop)
///     }
/// }
/// ```
#[async_trait]
pub trait ProbeStep: Send + Sync {
    /// Step identifier.
    fn id(&self) -> StepId;

    /// Runs the step.
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_serde() {
        for id in [
            StepId::Login,
            StepId::ImportStatus,
            StepId::RepeatDownloadStatus,
            StepId::PostImportDownloadStatus,
            StepId::HealthCheck,
        ] {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }
}
