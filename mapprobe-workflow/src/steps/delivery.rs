use async_trait::async_trait;
use chrono::Utc;
use mapprobe_core::MetricEvent;
use mapprobe_fetch::{ApiRequest, endpoint};
use tracing::{debug, info, instrument, warn};

use crate::context::{DELIVERY_STATUS_START, ProbeContext};
use crate::error::{StepError, success_body};
use crate::payloads::{
    ITEM_TYPE_MAP, PrepareDeliveryRequest, PreparedDeliveryResponse, UpdateDownloadStatusRequest,
    decode, to_body,
};
use crate::session::Session;
use crate::step::{ProbeStep, StepId};

/// Metric label for prepared-delivery lookups, without the import id.
const PREPARED_LABEL: &str = "api/delivery/preparedDelivery";

/// Posts one download-status report.
async fn post_download_status(
    ctx: &ProbeContext,
    device_id: &str,
    import_id: &str,
    token: &str,
) -> Result<(), StepError> {
    let body = to_body(&UpdateDownloadStatusRequest::new(
        device_id,
        import_id,
        DELIVERY_STATUS_START,
        Utc::now(),
    ))?;
    let outcome = ctx
        .gateway
        .call(ApiRequest::post("/api/delivery/updateDownloadStatus", &body).bearer(token))
        .await;
    success_body(outcome).map(drop)
}

/// Posts a status report whose failure must not end the run.
///
/// A failure is logged and counted as a `test_failures_total` event under
/// `step`.
async fn post_download_status_best_effort(
    ctx: &ProbeContext,
    step: StepId,
    device_id: &str,
    import_id: &str,
    token: &str,
) -> bool {
    match post_download_status(ctx, device_id, import_id, token).await {
        Ok(()) => true,
        Err(e) => {
            warn!(step = %step, error = %e, "Download status update failed");
            let reason = format!("status_update_failed_{DELIVERY_STATUS_START}");
            ctx.metrics.record(MetricEvent::test_failure(step.as_str(), &reason));
            false
        }
    }
}

// ============================================================================
// Update Download Status
// ============================================================================

/// Reports the download start. A failure ends the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateDownloadStatusStep;

#[async_trait]
impl ProbeStep for UpdateDownloadStatusStep {
    fn id(&self) -> StepId {
        StepId::UpdateDownloadStatus
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let import_id = session.require_import_id()?;
        let token = session.require_token()?;

        post_download_status(ctx, &session.device_id, import_id, token).await?;
        info!(import_request_id = %import_id, "Download status reported");
        Ok(())
    }
}

// ============================================================================
// Post-Import Status Update
// ============================================================================

/// Reports the download status once more after the import is terminal.
///
/// A failed report is recorded and logged; the run continues.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostImportStatusUpdateStep;

#[async_trait]
impl ProbeStep for PostImportStatusUpdateStep {
    fn id(&self) -> StepId {
        StepId::PostImportDownloadStatus
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let import_id = session.require_import_id()?;
        let token = session.require_token()?;

        if post_download_status_best_effort(ctx, self.id(), &session.device_id, import_id, token)
            .await
        {
            info!(import_request_id = %import_id, "Post-import download status reported");
        }
        Ok(())
    }
}

// ============================================================================
// Repeated Status Updates
// ============================================================================

/// Reports the download status several times after a successful download.
///
/// Each failed report is logged and counted under this step's
/// `test_name`. The step itself never fails once the import id is known.
#[derive(Debug, Default, Clone, Copy)]
pub struct RepeatedStatusUpdatesStep;

#[async_trait]
impl ProbeStep for RepeatedStatusUpdatesStep {
    fn id(&self) -> StepId {
        StepId::RepeatDownloadStatus
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let import_id = session.require_import_id()?;
        let token = session.require_token()?;
        let device_id = session.device_id.as_str();
        let step = self.id();

        let runs = ctx
            .settings
            .status_updates
            .repeat(ctx.sleeper.as_ref(), |attempt| async move {
                if !post_download_status_best_effort(ctx, step, device_id, import_id, token).await
                {
                    debug!(attempt, "Repeated download status update failed");
                }
            })
            .await;

        info!(runs, "Repeated download status updates sent");
        Ok(())
    }
}

// ============================================================================
// Prepare Delivery
// ============================================================================

/// Triggers delivery preparation and stores the resolved asset URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrepareDeliveryStep;

#[async_trait]
impl ProbeStep for PrepareDeliveryStep {
    fn id(&self) -> StepId {
        StepId::PrepareDelivery
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let import_id = session.require_import_id()?.to_string();
        let token = session.require_token()?.to_string();

        let body = to_body(&PrepareDeliveryRequest {
            catalog_id: &import_id,
            device_id: &session.device_id,
            item_type: ITEM_TYPE_MAP,
        })?;
        let outcome = ctx
            .gateway
            .call(ApiRequest::post("/api/delivery/prepareDelivery", &body).bearer(&token))
            .await;
        success_body(outcome)?;

        let lookup = format!("/api/delivery/preparedDelivery/{import_id}");
        let outcome = ctx
            .gateway
            .call(ApiRequest::get(&lookup).bearer(&token).labeled(PREPARED_LABEL))
            .await;
        let response: PreparedDeliveryResponse = decode(&success_body(outcome)?)?;

        let url = response
            .url
            .filter(|u| !u.is_empty())
            .ok_or(StepError::DataExtraction { field: "url" })?;
        let resolved = endpoint::resolve(ctx.gateway.base_url(), &url);

        info!(url = %resolved, "Prepared delivery URL");
        session.download_url = Some(resolved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BASE_URL, Harness, ScriptedGateway, ok, ok_empty};
    use mapprobe_core::{HttpMethod, RequestOutcome, metric_names};
    use serde_json::json;
    use std::time::Duration;

    const UPDATE: &str = "/api/delivery/updateDownloadStatus";

    fn session() -> Session {
        let mut session = Session::generate();
        session.auth_token = Some("t-1".into());
        session.import_request_id = Some("abc123".into());
        session
    }

    #[tokio::test]
    async fn test_update_posts_start_status() {
        let gateway = ScriptedGateway::new();
        gateway.on(HttpMethod::Post, UPDATE, vec![ok_empty()]);
        let h = Harness::new(gateway);
        let session = &mut session();

        UpdateDownloadStatusStep.execute(&h.ctx, session).await.unwrap();

        let body = h.gateway.calls()[0].body.clone().unwrap();
        assert_eq!(body["deviceId"], session.device_id.as_str());
        assert_eq!(body["catalogId"], "abc123");
        assert_eq!(body["deliveryStatus"], "Start");
    }

    #[tokio::test]
    async fn test_update_failure_is_error() {
        let gateway = ScriptedGateway::new();
        gateway.on(
            HttpMethod::Post,
            UPDATE,
            vec![RequestOutcome::ClientError { status_code: 400 }],
        );
        let h = Harness::new(gateway);

        let err = UpdateDownloadStatusStep
            .execute(&h.ctx, &mut session())
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::ClientProtocol { status: 400 }));
    }

    #[tokio::test]
    async fn test_update_without_import_id_makes_no_call() {
        let h = Harness::new(ScriptedGateway::new());
        let mut session = Session::generate();
        session.auth_token = Some("t-1".into());

        let err = UpdateDownloadStatusStep
            .execute(&h.ctx, &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, StepError::MissingImportId));
        assert!(h.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_updates_are_best_effort() {
        let gateway = ScriptedGateway::new();
        gateway.on(
            HttpMethod::Post,
            UPDATE,
            vec![
                ok_empty(),
                RequestOutcome::ServerError { status_code: 502 },
                ok_empty(),
                RequestOutcome::TransportError {
                    kind: mapprobe_core::TransportKind::Timeout,
                    message: "timed out".into(),
                },
                ok_empty(),
            ],
        );
        let h = Harness::new(gateway);

        RepeatedStatusUpdatesStep
            .execute(&h.ctx, &mut session())
            .await
            .unwrap();

        assert_eq!(h.gateway.calls_to(UPDATE), 5);
        assert_eq!(h.sleeper.sleeps(), vec![Duration::from_secs(2); 4]);

        let failures = h.sink.named(metric_names::TEST_FAILURES_TOTAL);
        assert_eq!(failures.len(), 2);
        for event in &failures {
            assert_eq!(event.label("test_name"), Some("repeat_download_status"));
            assert_eq!(
                event.label("failure_reason"),
                Some("status_update_failed_Start")
            );
        }
    }

    #[tokio::test]
    async fn test_post_import_update_failure_continues() {
        let gateway = ScriptedGateway::new();
        gateway.on(
            HttpMethod::Post,
            UPDATE,
            vec![RequestOutcome::ServerError { status_code: 503 }],
        );
        let h = Harness::new(gateway);

        PostImportStatusUpdateStep
            .execute(&h.ctx, &mut session())
            .await
            .unwrap();

        assert_eq!(h.gateway.calls_to(UPDATE), 1);
        let failures = h.sink.named(metric_names::TEST_FAILURES_TOTAL);
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].label("test_name"),
            Some("post_import_download_status")
        );
        assert_eq!(
            failures[0].label("failure_reason"),
            Some("status_update_failed_Start")
        );
    }

    #[tokio::test]
    async fn test_post_import_update_success_records_nothing() {
        let gateway = ScriptedGateway::new();
        gateway.on(HttpMethod::Post, UPDATE, vec![ok_empty()]);
        let h = Harness::new(gateway);

        PostImportStatusUpdateStep
            .execute(&h.ctx, &mut session())
            .await
            .unwrap();

        assert_eq!(h.gateway.calls_to(UPDATE), 1);
        assert!(h.sink.named(metric_names::TEST_FAILURES_TOTAL).is_empty());
    }

    #[tokio::test]
    async fn test_post_import_update_without_import_id_makes_no_call() {
        let h = Harness::new(ScriptedGateway::new());
        let mut session = session();
        session.import_request_id = None;

        let err = PostImportStatusUpdateStep
            .execute(&h.ctx, &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, StepError::MissingImportId));
        assert!(h.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_resolves_relative_url() {
        for url in ["/files/abc123.gpkg", "files/abc123.gpkg"] {
            let gateway = ScriptedGateway::new();
            gateway.on(HttpMethod::Post, "/api/delivery/prepareDelivery", vec![ok_empty()]);
            gateway.on(
                HttpMethod::Get,
                "/api/delivery/preparedDelivery/abc123",
                vec![ok(json!({ "url": url }))],
            );
            let h = Harness::new(gateway);
            let mut session = session();

            PrepareDeliveryStep.execute(&h.ctx, &mut session).await.unwrap();

            assert_eq!(
                session.download_url.as_deref(),
                Some(format!("{BASE_URL}/files/abc123.gpkg").as_str())
            );
            let calls = h.gateway.calls();
            assert_eq!(calls[0].body.as_ref().unwrap()["itemType"], "map");
            assert_eq!(calls[1].label, PREPARED_LABEL);
        }
    }

    #[tokio::test]
    async fn test_prepare_keeps_absolute_url() {
        let gateway = ScriptedGateway::new();
        gateway.on(HttpMethod::Post, "/api/delivery/prepareDelivery", vec![ok_empty()]);
        gateway.on(
            HttpMethod::Get,
            "/api/delivery/preparedDelivery/abc123",
            vec![ok(json!({"url": "https://cdn.test/x/abc123.gpkg"}))],
        );
        let h = Harness::new(gateway);
        let mut session = session();

        PrepareDeliveryStep.execute(&h.ctx, &mut session).await.unwrap();
        assert_eq!(
            session.download_url.as_deref(),
            Some("https://cdn.test/x/abc123.gpkg")
        );
    }

    #[tokio::test]
    async fn test_prepare_failure_skips_lookup() {
        let gateway = ScriptedGateway::new();
        gateway.on(
            HttpMethod::Post,
            "/api/delivery/prepareDelivery",
            vec![RequestOutcome::ServerError { status_code: 500 }],
        );
        let h = Harness::new(gateway);

        let err = PrepareDeliveryStep.execute(&h.ctx, &mut session()).await.unwrap_err();

        assert_eq!(err.reason(), "server_error");
        assert_eq!(h.gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_prepare_without_import_id_makes_no_call() {
        let h = Harness::new(ScriptedGateway::new());
        let mut session = session();
        session.import_request_id = None;

        let err = PrepareDeliveryStep.execute(&h.ctx, &mut session).await.unwrap_err();

        assert!(matches!(err, StepError::MissingImportId));
        assert!(h.gateway.calls().is_empty());
        assert!(session.download_url.is_none());
    }

    #[tokio::test]
    async fn test_prepare_missing_url() {
        let gateway = ScriptedGateway::new();
        gateway.on(HttpMethod::Post, "/api/delivery/prepareDelivery", vec![ok_empty()]);
        gateway.on(
            HttpMethod::Get,
            "/api/delivery/preparedDelivery/abc123",
            vec![ok(json!({"status": "pending"}))],
        );
        let h = Harness::new(gateway);

        let err = PrepareDeliveryStep.execute(&h.ctx, &mut session()).await.unwrap_err();
        assert!(matches!(err, StepError::DataExtraction { field: "url" }));
    }
}
