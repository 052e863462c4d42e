//! Probe pipeline for executing steps in order.
//!
//! The pipeline runs its steps against one fresh session and stops at the
//! first failure. Failures are attributed to the failing step in the
//! metrics and in the returned [`RunReport`].

use std::time::{Duration, Instant};

use mapprobe_core::MetricEvent;
use serde::{Serialize, Serializer};
use tracing::{error, info, instrument};

use crate::context::ProbeContext;
use crate::session::Session;
use crate::step::{ProbeStep, StepId};
use crate::steps::{
    DiscoverStep, DownloadFilesStep, HealthCheckStep, ImportCreateStep, ImportStatusStep,
    LoginStep, PostImportStatusUpdateStep, PrepareDeliveryStep, RepeatedStatusUpdatesStep,
    UpdateDownloadStatusStep, UpdateInventoryStep,
};

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

// ============================================================================
// Step Record
// ============================================================================

/// Record of a single step execution.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// The step that ran.
    pub step: StepId,
    /// Whether it succeeded.
    pub success: bool,
    /// Error message if it failed.
    pub error: Option<String>,
    /// How long it took.
    #[serde(rename = "duration_secs", serialize_with = "as_secs")]
    pub duration: Duration,
}

// ============================================================================
// Run Outcome
// ============================================================================

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every step passed.
    Completed,
    /// A step failed and the remaining steps were skipped.
    Aborted {
        /// The failing step.
        step: StepId,
        /// Failure reason label.
        reason: String,
        /// Error message.
        message: String,
    },
}

impl RunOutcome {
    /// Label for the `outcome` metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// The result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Device id of the run's session.
    pub device_id: String,
    /// Terminal state.
    pub outcome: RunOutcome,
    /// Steps that ran, in order.
    pub steps: Vec<StepRecord>,
    /// Total duration.
    #[serde(rename = "duration_secs", serialize_with = "as_secs")]
    pub duration: Duration,
}

impl RunReport {
    /// Returns true if the run completed.
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    /// Returns the failing step, if any.
    pub fn failed_step(&self) -> Option<StepId> {
        match &self.outcome {
            RunOutcome::Completed => None,
            RunOutcome::Aborted { step, .. } => Some(*step),
        }
    }
}

// ============================================================================
// Probe Pipeline
// ============================================================================

/// An ordered list of probe steps.
pub struct ProbePipeline {
    steps: Vec<Box<dyn ProbeStep>>,
}

impl ProbePipeline {
    /// Creates a pipeline with the given steps, run in the given order.
    pub fn with_steps(steps: Vec<Box<dyn ProbeStep>>) -> Self {
        Self { steps }
    }

    /// The full end-to-end run.
    ///
    /// The download start is reported right after the import is created and
    /// gates the run; the reports after polling and after the download are
    /// best-effort.
    pub fn full() -> Self {
        Self::with_steps(vec![
            Box::new(LoginStep),
            Box::new(DiscoverStep),
            Box::new(ImportCreateStep),
            Box::new(UpdateDownloadStatusStep),
            Box::new(ImportStatusStep),
            Box::new(PostImportStatusUpdateStep),
            Box::new(PrepareDeliveryStep),
            Box::new(DownloadFilesStep),
            Box::new(RepeatedStatusUpdatesStep),
            Box::new(UpdateInventoryStep),
            Box::new(HealthCheckStep),
        ])
    }

    /// Only the health checks.
    pub fn health_only() -> Self {
        Self::with_steps(vec![Box::new(HealthCheckStep)])
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the pipeline has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step ids in execution order.
    pub fn step_ids(&self) -> Vec<StepId> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    /// Runs the pipeline with a freshly generated session.
    pub async fn run(&self, ctx: &ProbeContext) -> RunReport {
        self.run_with_session(ctx, Session::generate()).await
    }

    /// Runs the pipeline with the given session.
    #[instrument(skip_all, fields(device_id = %session.device_id, steps = self.steps.len()))]
    pub async fn run_with_session(&self, ctx: &ProbeContext, mut session: Session) -> RunReport {
        let start = Instant::now();
        let mut records = Vec::with_capacity(self.steps.len());
        let mut outcome = RunOutcome::Completed;

        info!("Starting probe run");

        for step in &self.steps {
            let id = step.id();
            let step_start = Instant::now();

            match step.execute(ctx, &mut session).await {
                Ok(()) => {
                    info!(step = %id, duration = ?step_start.elapsed(), "Step passed");
                    records.push(StepRecord {
                        step: id,
                        success: true,
                        error: None,
                        duration: step_start.elapsed(),
                    });
                }
                Err(e) => {
                    let reason = e.reason();
                    error!(step = %id, reason, error = %e, "Step failed");
                    ctx.metrics.record(MetricEvent::test_failure(id.as_str(), reason));
                    records.push(StepRecord {
                        step: id,
                        success: false,
                        error: Some(e.to_string()),
                        duration: step_start.elapsed(),
                    });
                    outcome = RunOutcome::Aborted {
                        step: id,
                        reason: reason.to_string(),
                        message: e.to_string(),
                    };
                    break;
                }
            }
        }

        let duration = start.elapsed();
        ctx.metrics.record_all(vec![
            MetricEvent::run(outcome.label()),
            MetricEvent::run_duration(duration.as_secs_f64()),
        ]);

        match &outcome {
            RunOutcome::Completed => info!(duration = ?duration, "All steps completed successfully"),
            RunOutcome::Aborted { step, .. } => error!(step = %step, "Probe run aborted"),
        }

        RunReport {
            device_id: session.device_id,
            outcome,
            steps: records,
            duration,
        }
    }
}

impl std::fmt::Debug for ProbePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbePipeline")
            .field("steps", &self.step_ids())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
