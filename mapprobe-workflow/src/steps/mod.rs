//! Pipeline step implementations.
//!
//! Steps, in pipeline order:
//! - [`LoginStep`] - `POST /api/login`
//! - [`DiscoverStep`] - `POST /api/device/discover`
//! - [`ImportCreateStep`] - `POST /api/map/import/create`
//! - [`UpdateDownloadStatusStep`] - `POST /api/delivery/updateDownloadStatus`
//! - [`ImportStatusStep`] - `GET /api/map/import/status/{id}` until terminal
//! - [`PostImportStatusUpdateStep`] - best-effort status report
//! - [`PrepareDeliveryStep`] - prepare, then fetch the asset URL
//! - [`DownloadFilesStep`] - the asset and its `.json` sibling
//! - [`RepeatedStatusUpdatesStep`] - best-effort status reports
//! - [`UpdateInventoryStep`] - `POST /api/map/inventory/updates`
//! - [`HealthCheckStep`] - every subsystem health endpoint

mod delivery;
mod discover;
mod download;
mod health;
mod import;
mod inventory;
mod login;

pub use delivery::{
    PostImportStatusUpdateStep, PrepareDeliveryStep, RepeatedStatusUpdatesStep,
    UpdateDownloadStatusStep,
};
pub use discover::DiscoverStep;
pub use download::{DownloadFilesStep, file_type, sibling_url};
pub use health::HealthCheckStep;
pub use import::{ImportCreateStep, ImportStatusStep};
pub use inventory::UpdateInventoryStep;
pub use login::LoginStep;

use mapprobe_fetch::ApiRequest;

/// Attaches the bearer token when there is one.
fn with_token<'a>(request: ApiRequest<'a>, token: Option<&'a str>) -> ApiRequest<'a> {
    match token {
        Some(token) => request.bearer(token),
        None => request,
    }
}
