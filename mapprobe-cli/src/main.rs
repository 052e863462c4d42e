// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! mapprobe CLI - synthetic monitoring for the GetApp map-delivery API.
//!
//! # Examples
//!
//! ```bash
//! # Probe every five minutes and export metrics on :8000
//! mapprobe
//!
//! # Custom schedule and port
//! mapprobe --schedule "*/15 * * * *" --metrics-port 9100 run
//!
//! # One full run, JSON report
//! mapprobe once --format json --pretty
//!
//! # Health checks only
//! mapprobe check
//! ```

mod commands;
mod config;
mod output;
mod scheduler;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mapprobe_workflow::ProbePipeline;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::{DEFAULT_BASE_URL, DEFAULT_METRICS_PORT, DEFAULT_SCHEDULE, ProbeConfig};

// ============================================================================
// CLI Definition
// ============================================================================

/// mapprobe - synthetic monitoring for the GetApp map-delivery API.
#[derive(Parser)]
#[command(name = "mapprobe")]
#[command(about = "Synthetic-monitoring probe for the GetApp map-delivery API")]
#[command(long_about = r#"
mapprobe drives the GetApp API end to end on a schedule: login, device
discovery, map import, delivery, download, inventory update and subsystem
health checks. Every step is exported as Prometheus metrics.

Examples:
  mapprobe                           # Probe on schedule, metrics on :8000
  mapprobe once                      # One full run, then exit
  mapprobe check                     # Health checks only
  mapprobe once --format json        # JSON run report
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'run' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// GetApp API base URL.
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Login username.
    #[arg(long, env = "GETAPP_USERNAME", global = true)]
    pub username: Option<String>,

    /// Login password.
    #[arg(long, env = "GETAPP_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Cron schedule for runs (five or six fields, UTC).
    #[arg(long, env = "TEST_SCHEDULE", default_value = DEFAULT_SCHEDULE, global = true)]
    pub schedule: String,

    /// Fixed wait between runs in seconds. Overrides --schedule.
    #[arg(long, env = "TEST_INTERVAL_SECS", global = true)]
    pub interval_secs: Option<u64>,

    /// Port of the metrics exporter.
    #[arg(long, env = "METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT, global = true)]
    pub metrics_port: u16,

    /// Per-request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = mapprobe_fetch::host::http::DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// Also write logs to this file.
    #[arg(long, env = "LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Output format for one-shot reports (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (debug logging).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Start the metrics exporter and probe on schedule (default).
    Run,

    /// One full run without the exporter.
    Once,

    /// Health checks only.
    Check,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// Run aborted or runtime error.
    Aborted = 1,
    /// Invalid configuration.
    Config = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("mapprobe=debug,info")
        } else {
            EnvFilter::new("mapprobe=info,warn")
        }
    });

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {e:#}");
        std::process::exit(ExitCode::Aborted as i32);
    }

    let config = match ProbeConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("Error: {e}");
            std::process::exit(ExitCode::Config as i32);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&config).await.map(|()| ExitCode::Success),
        Commands::Once => commands::once::run(&config, ProbePipeline::full(), &cli).await,
        Commands::Check => commands::once::run(&config, ProbePipeline::health_only(), &cli).await,
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            error!(error = %e, "mapprobe failed");
            eprintln!("Error: {e:#}");
            std::process::exit(ExitCode::Aborted as i32);
        }
    }
}
