//! Text output formatting with colors.

use std::time::Duration;

use mapprobe_workflow::{RunOutcome, RunReport, StepRecord};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats a run report: one line per step, then a summary line.
    pub fn format_report(&self, report: &RunReport) -> String {
        let mut lines = vec![format!(
            "{} {}",
            self.bold("mapprobe run"),
            self.dim(&format!("(device {})", report.device_id))
        )];

        for record in &report.steps {
            lines.push(self.format_step(record));
        }

        let summary = match &report.outcome {
            RunOutcome::Completed => self.green(&format!(
                "All {} steps passed in {}",
                report.steps.len(),
                format_duration(report.duration)
            )),
            RunOutcome::Aborted { step, reason, .. } => self.red(&format!(
                "Aborted at {step} ({reason}) after {}",
                format_duration(report.duration)
            )),
        };
        lines.push(String::new());
        lines.push(summary);

        lines.join("\n")
    }

    fn format_step(&self, record: &StepRecord) -> String {
        let mark = if record.success {
            self.green("✓")
        } else {
            self.red("✗")
        };
        let mut line = format!(
            "  {mark} {:<24} {}",
            record.step.as_str(),
            self.dim(&format_duration(record.duration))
        );
        if let Some(error) = &record.error {
            line.push_str(&format!("\n      {error}"));
        }
        line
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}

/// Formats a duration as seconds or milliseconds.
fn format_duration(duration: Duration) -> String {
    if duration >= Duration::from_secs(1) {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
