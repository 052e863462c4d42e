use async_trait::async_trait;
use chrono::Utc;
use mapprobe_fetch::ApiRequest;
use tracing::{info, instrument};

use crate::context::ProbeContext;
use crate::error::{StepError, success_body};
use crate::payloads::discovery_document;
use crate::session::Session;
use crate::step::{ProbeStep, StepId};

/// Announces the synthetic device and its map request.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscoverStep;

#[async_trait]
impl ProbeStep for DiscoverStep {
    fn id(&self) -> StepId {
        StepId::Discovery
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let token = session.require_token()?;
        let body = discovery_document(&session.device_id, Utc::now());

        let outcome = ctx
            .gateway
            .call(ApiRequest::post("/api/device/discover", &body).bearer(token))
            .await;
        success_body(outcome)?;

        info!("Device discovered");
        Ok(())
    }
}
