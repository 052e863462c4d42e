use async_trait::async_trait;
use mapprobe_core::{ImportStatus, MetricEvent, RequestOutcome};
use mapprobe_fetch::{ApiRequest, Attempt, RetryOutcome};
use tracing::{debug, info, instrument, warn};

use crate::context::ProbeContext;
use crate::error::{StepError, success_body};
use crate::payloads::{
    ImportCreateRequest, ImportCreateResponse, ImportStatusResponse, decode, to_body,
};
use crate::session::Session;
use crate::step::{ProbeStep, StepId};

/// Metric label for status polls, without the import id.
const STATUS_LABEL: &str = "api/map/import/status";

// ============================================================================
// Import Create
// ============================================================================

/// Requests a map import for one of the session's bbox candidates.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportCreateStep;

#[async_trait]
impl ProbeStep for ImportCreateStep {
    fn id(&self) -> StepId {
        StepId::ImportMap
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let token = session.require_token()?.to_string();
        let bbox = session
            .pick_bbox(&mut rand::thread_rng())
            .ok_or(StepError::DataExtraction {
                field: "boundingBox",
            })?
            .to_string();

        let body = to_body(&ImportCreateRequest::new(&session.device_id, &bbox))?;
        let outcome = ctx
            .gateway
            .call(ApiRequest::post("/api/map/import/create", &body).bearer(&token))
            .await;

        let response: ImportCreateResponse = decode(&success_body(outcome)?)?;
        let import_id = response
            .import_request_id
            .filter(|id| !id.is_empty())
            .ok_or(StepError::DataExtraction {
                field: "importRequestId",
            })?;

        info!(import_request_id = %import_id, bbox = %bbox, "Import created");
        session.import_request_id = Some(import_id);
        Ok(())
    }
}

// ============================================================================
// Import Status Poll
// ============================================================================

/// Polls the import until it is `Done` or `Error`.
///
/// Values other than the known statuses are counted as anomalies and polling
/// continues. A failed call ends the step at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportStatusStep;

#[async_trait]
impl ProbeStep for ImportStatusStep {
    fn id(&self) -> StepId {
        StepId::ImportStatus
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let import_id = session.require_import_id()?;
        let token = session.require_token()?;
        let endpoint = format!("/api/map/import/status/{import_id}");
        let endpoint = endpoint.as_str();

        let outcome = ctx
            .settings
            .status_poll
            .run(ctx.sleeper.as_ref(), |attempt| async move {
                let outcome = ctx
                    .gateway
                    .call(ApiRequest::get(endpoint).bearer(token).labeled(STATUS_LABEL))
                    .await;
                poll_once(ctx, outcome, attempt)
            })
            .await;

        match outcome {
            RetryOutcome::Done { value, attempts } => {
                debug!(attempts, "Import status polling finished");
                value
            }
            RetryOutcome::Exhausted { attempts } => {
                warn!(attempts, "Import never reached a terminal status");
                Err(StepError::RetryBudgetExhausted { attempts })
            }
        }
    }
}

/// Interprets one poll response.
fn poll_once(
    ctx: &ProbeContext,
    outcome: RequestOutcome,
    attempt: u32,
) -> Attempt<Result<(), StepError>> {
    let body = match success_body(outcome) {
        Ok(body) => body,
        Err(e) => {
            ctx.metrics.record(MetricEvent::import_status_anomaly("api_error"));
            return Attempt::Done(Err(e));
        }
    };

    let raw = match decode::<ImportStatusResponse>(&body) {
        Ok(response) => response.status,
        Err(e) => {
            warn!(attempt, error = %e, "Unreadable import status response");
            None
        }
    };

    let status = raw.as_deref().map_or(ImportStatus::Unknown(String::new()), ImportStatus::parse);
    debug!(attempt, status = %status, "Import status");

    match status {
        ImportStatus::Done => {
            info!(attempt, "Import done");
            Attempt::Done(Ok(()))
        }
        ImportStatus::Error => Attempt::Done(Err(StepError::ImportFailed)),
        ImportStatus::Processing => Attempt::Retry,
        ImportStatus::Unknown(_) => {
            let label = raw.as_deref().filter(|s| !s.is_empty()).unwrap_or("missing");
            warn!(attempt, status = %label, "Unexpected import status");
            ctx.metrics.record(MetricEvent::import_status_anomaly(label));
            Attempt::Retry
        }
    }
}
