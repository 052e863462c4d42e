use async_trait::async_trait;
use mapprobe_fetch::ApiRequest;
use tracing::{info, instrument};

use crate::context::ProbeContext;
use crate::error::{StepError, success_body};
use crate::payloads::{InventoryUpdateRequest, to_body};
use crate::session::Session;
use crate::step::{ProbeStep, StepId};

/// Reports the imported map as delivered to the device.
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateInventoryStep;

#[async_trait]
impl ProbeStep for UpdateInventoryStep {
    fn id(&self) -> StepId {
        StepId::UpdateInventory
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let import_id = session.require_import_id()?;
        let token = session.require_token()?;

        let body = to_body(&InventoryUpdateRequest::delivered(&session.device_id, import_id))?;
        let outcome = ctx
            .gateway
            .call(ApiRequest::post("/api/map/inventory/updates", &body).bearer(token))
            .await;
        success_body(outcome)?;

        info!(import_request_id = %import_id, "Inventory updated");
        Ok(())
    }
}
