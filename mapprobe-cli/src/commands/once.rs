//! One-shot commands: a single full run, or the health checks alone.

use std::sync::Arc;

use anyhow::Result;
use mapprobe_metrics::RecordingSink;
use mapprobe_workflow::{ProbePipeline, RunReport};

use crate::config::ProbeConfig;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs `pipeline` once without the exporter and prints the report.
pub async fn run(config: &ProbeConfig, pipeline: ProbePipeline, cli: &Cli) -> Result<ExitCode> {
    let sink = Arc::new(RecordingSink::new());
    let ctx = config.context(sink)?;

    let report = pipeline.run(&ctx).await;
    println!("{}", render(&report, cli)?);

    Ok(if report.is_success() {
        ExitCode::Success
    } else {
        ExitCode::Aborted
    })
}

fn render(report: &RunReport, cli: &Cli) -> Result<String> {
    match cli.format {
        OutputFormat::Text => Ok(TextFormatter::new(!cli.no_color).format_report(report)),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format(report),
    }
}
