// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::deploy::RunReport;
use crate::platform::SlotStatus;
use crate::types::{RoutingState, ServiceName};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => emit_stderr(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => emit_stdout(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => emit_stderr(&JsonEvent {
                event: "error",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Report the terminal outcome of a run.
    pub fn outcome(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Json => emit_stdout(&OutcomeEvent {
                event: "outcome",
                report,
                duration_secs: self.duration(),
            }),
            _ => {
                let message = report.outcome.to_string();
                if report.outcome.is_success() {
                    self.success(&message);
                } else {
                    eprintln!("{message}");
                }
            }
        }
    }

    /// Print the slot table for `slotswap status`.
    pub fn status(&self, service: &ServiceName, routing: &RoutingState, slots: &[SlotStatus]) {
        match self.mode {
            OutputMode::Json => emit_stdout(&StatusEvent {
                event: "status",
                service,
                routing: routing.to_string(),
                slots,
            }),
            OutputMode::Quiet => println!("{routing}"),
            OutputMode::Normal => {
                println!("{service}: {routing}");
                for slot in slots {
                    let live = routing.live_color() == Some(slot.color);
                    println!(
                        "  {:<6} {:<8} {}{}",
                        slot.color,
                        if slot.running { "running" } else { "stopped" },
                        slot.image.as_deref().unwrap_or("-"),
                        if live { "  (live)" } else { "" },
                    );
                }
            }
        }
    }
}

fn emit_stdout<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn emit_stderr<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct OutcomeEvent<'a> {
    event: &'a str,
    #[serde(flatten)]
    report: &'a RunReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct StatusEvent<'a> {
    event: &'a str,
    service: &'a ServiceName,
    routing: String,
    slots: &'a [SlotStatus],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_mode_is_reported() {
        let output = Output::new(OutputMode::Quiet);
        assert_eq!(output.mode(), OutputMode::Quiet);
        assert_eq!(output.elapsed_secs(), 0.0);
    }

    #[test]
    fn timer_reports_duration_once_started() {
        let mut output = Output::new(OutputMode::Json);
        assert!(output.duration().is_none());
        output.start_timer();
        assert!(output.duration().is_some());
    }
}
