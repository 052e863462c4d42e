//! Run command - exporter plus the scheduled probe loop.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use mapprobe_metrics::{PrometheusSink, exporter};
use mapprobe_workflow::ProbePipeline;
use tracing::info;

use crate::config::ProbeConfig;
use crate::scheduler;

/// Runs the exporter and the probe loop until Ctrl+C.
pub async fn run(config: &ProbeConfig) -> Result<()> {
    info!(base_url = %config.base_url, schedule = ?config.schedule, "Starting mapprobe");

    let sink = Arc::new(PrometheusSink::new()?);
    let mut server = tokio::spawn(exporter::serve(config.metrics_addr, sink.clone()));

    let ctx = config.context(sink)?;
    let pipeline = ProbePipeline::full();

    tokio::select! {
        () = scheduler::run_forever(&config.schedule, &pipeline, &ctx) => Ok(()),
        joined = &mut server => match joined {
            Ok(Ok(())) => Err(anyhow!("metrics server stopped unexpectedly")),
            Ok(Err(e)) => Err(e.into()),
            Err(e) => Err(anyhow!("metrics server task failed: {e}")),
        },
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Received Ctrl+C, shutting down");
            server.abort();
            Ok(())
        }
    }
}
