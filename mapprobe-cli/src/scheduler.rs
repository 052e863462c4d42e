//! Run scheduling and the per-run failure boundary.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use mapprobe_core::MetricEvent;
use mapprobe_workflow::{ProbeContext, ProbePipeline, RunReport};
use tracing::{error, info};

use crate::config::ConfigError;

/// Test name reported when a run dies outside any step.
const RUN_TEST_NAME: &str = "run_full_test";

/// When the next run starts.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Fixed wait after each run.
    Interval(Duration),
    /// Cron expression evaluated in UTC.
    Cron(Box<cron::Schedule>),
}

impl Schedule {
    /// Parses a cron expression.
    ///
    /// Five-field expressions (`min hour dom mon dow`) get a leading seconds
    /// field of `0`. Six and seven fields are passed through.
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let trimmed = expression.trim();
        let normalized = if trimmed.split_whitespace().count() == 5 {
            format!("0 {trimmed}")
        } else {
            trimmed.to_string()
        };

        cron::Schedule::from_str(&normalized)
            .map(|schedule| Self::Cron(Box::new(schedule)))
            .map_err(|e| ConfigError::InvalidSchedule {
                expression: expression.to_string(),
                message: e.to_string(),
            })
    }

    /// Fixed interval in seconds. Zero is rejected.
    pub fn interval(secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::InvalidSchedule {
                expression: secs.to_string(),
                message: "interval must be at least one second".to_string(),
            });
        }
        Ok(Self::Interval(Duration::from_secs(secs)))
    }

    /// Time to wait from `now` until the next run.
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Self::Interval(interval) => *interval,
            Self::Cron(schedule) => schedule
                .after(&now)
                .next()
                .and_then(|next| (next - now).to_std().ok())
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// Runs the pipeline once, containing any panic.
///
/// A panic is logged and counted as an `unexpected_error` failure; the
/// caller carries on with the next cycle.
pub async fn run_cycle(pipeline: &ProbePipeline, ctx: &ProbeContext) -> Option<RunReport> {
    match AssertUnwindSafe(pipeline.run(ctx)).catch_unwind().await {
        Ok(report) => Some(report),
        Err(panic) => {
            error!(error = %panic_message(panic.as_ref()), "Error during test run");
            ctx.metrics
                .record(MetricEvent::test_failure(RUN_TEST_NAME, "unexpected_error"));
            None
        }
    }
}

/// Runs the pipeline forever: run, then wait for the next trigger.
pub async fn run_forever(schedule: &Schedule, pipeline: &ProbePipeline, ctx: &ProbeContext) {
    loop {
        run_cycle(pipeline, ctx).await;

        let now = Utc::now();
        let delay = schedule.next_delay(now);
        if !delay.is_zero() {
            let next_run = chrono::Duration::from_std(delay).map_or(now, |d| now + d);
            info!(next_run = %next_run, "Waiting until next scheduled run");
            ctx.sleeper.sleep(delay).await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
