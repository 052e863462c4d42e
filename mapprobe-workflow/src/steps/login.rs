use async_trait::async_trait;
use mapprobe_core::RequestOutcome;
use mapprobe_fetch::ApiRequest;
use tracing::{info, instrument};

use crate::context::ProbeContext;
use crate::error::StepError;
use crate::payloads::{LoginRequest, LoginResponse, decode, to_body};
use crate::session::Session;
use crate::step::{ProbeStep, StepId};

/// Exchanges the configured credentials for a bearer token.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoginStep;

#[async_trait]
impl ProbeStep for LoginStep {
    fn id(&self) -> StepId {
        StepId::Login
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let (username, password) = ctx
            .settings
            .credentials
            .pair()
            .ok_or(StepError::MissingCredentials)?;

        let body = to_body(&LoginRequest { username, password })?;
        let outcome = ctx.gateway.call(ApiRequest::post("/api/login", &body)).await;

        let bytes = match outcome {
            RequestOutcome::Success { body, .. } => body,
            other => return Err(StepError::Authentication(other.to_string())),
        };

        let response: LoginResponse = decode(&bytes)?;
        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(StepError::DataExtraction {
                field: "accessToken",
            })?;

        session.auth_token = Some(token);
        info!("Logged in");
        Ok(())
    }
}
