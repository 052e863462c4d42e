use async_trait::async_trait;
use mapprobe_core::MetricEvent;
use mapprobe_fetch::{ApiRequest, endpoint};
use tracing::{info, instrument, warn};

use super::with_token;
use crate::context::ProbeContext;
use crate::error::StepError;
use crate::session::Session;
use crate::step::{ProbeStep, StepId};

/// Checks every configured health endpoint in order.
///
/// Never short-circuits. Works without a token, so it can run on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct HealthCheckStep;

#[async_trait]
impl ProbeStep for HealthCheckStep {
    fn id(&self) -> StepId {
        StepId::HealthCheck
    }

    #[instrument(skip_all, fields(device_id = %session.device_id))]
    async fn execute(&self, ctx: &ProbeContext, session: &mut Session) -> Result<(), StepError> {
        let token = session.auth_token.as_deref();
        let mut unhealthy = Vec::new();

        for path in &ctx.settings.health_endpoints {
            let outcome = ctx.gateway.call(with_token(ApiRequest::get(path), token)).await;
            if outcome.is_success() {
                continue;
            }

            let label = endpoint::metric_label(path);
            warn!(endpoint = %label, outcome = %outcome, "Health check failed");
            ctx.metrics.record(MetricEvent::health_check_failure(&label));
            ctx.metrics.record(MetricEvent::test_failure(self.id().as_str(), path));
            unhealthy.push(label);
        }

        if unhealthy.is_empty() {
            info!(endpoints = ctx.settings.health_endpoints.len(), "All health checks passed");
            Ok(())
        } else {
            Err(StepError::Unhealthy {
                endpoints: unhealthy,
            })
        }
    }
}
