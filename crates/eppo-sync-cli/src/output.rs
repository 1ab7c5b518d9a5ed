//! Output formatting and writing utilities
//!
//! This module formats command results in the selected format (JSON, YAML,
//! human-readable), with specialized human rendering for sync reports and
//! schema violations, plus a spinner for the network call.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use eppo_sync_core::{Severity, SyncOutcome, SyncReport};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the summary of a sync run
    fn format_sync_report(&self, report: &SyncReport) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Human output falls back to pretty JSON for arbitrary data
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_sync_report(&self, report: &SyncReport) -> Result<String> {
        match self {
            OutputFormat::Human => format_sync_report_human(report),
            _ => self.format(report),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            writer,
        }
    }

    /// Turn the spinner off even on a terminal
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress &= enabled;
        self
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);
        trace!(
            "Outputting data: {}",
            serde_json::to_string(&value_json).unwrap_or_else(|_| "[failed to serialize]".to_string())
        );

        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a sync report
    ///
    /// Machine formats get the whole report as one document; human output
    /// gets a summary with skipped items and warnings.
    pub fn sync_report(&mut self, report: &SyncReport) -> Result<()> {
        if self.format == OutputFormat::Human {
            if self.quiet {
                return Ok(());
            }
            self.section("Sync Summary")?;
        }
        let formatted = self.format.format_sync_report(report)?;
        self.writeln(formatted.trim_end())
    }

    /// Write schema violations, one per line
    pub fn violations(&mut self, violations: &[String]) -> Result<()> {
        if self.format == OutputFormat::Human {
            for violation in violations {
                self.error(&format!("  • {}", violation))?;
            }
            Ok(())
        } else {
            self.data(&serde_json::json!({
                "valid": violations.is_empty(),
                "violations": violations,
            }))
        }
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Format a sync report for human reading
fn format_sync_report_human(report: &SyncReport) -> Result<String> {
    let mut output = String::new();

    output.push_str(&format!("Mode: {}\n", report.mode));
    if let Some(tag) = &report.sync_tag {
        output.push_str(&format!("Sync tag: {}\n", tag));
    }
    output.push_str(&format!(
        "Found: {} semantic model(s), {} metric(s)\n",
        report.semantic_models_found, report.metrics_found
    ));
    output.push_str(&format!(
        "Mapped: {} fact source(s), {} metric(s)\n",
        report.fact_sources, report.metrics
    ));

    let outcome = match &report.outcome {
        SyncOutcome::NothingToSync => "No semantic models found; nothing was sent".to_string(),
        SyncOutcome::Rendered { .. } => "Dry run: payload validated, nothing was sent".to_string(),
        SyncOutcome::Submitted { .. } => "Payload accepted by Eppo".to_string(),
    };
    output.push_str(&format!("Result: {}\n", outcome));

    if !report.skipped.is_empty() {
        output.push_str(&format!("\nSkipped ({}):\n", report.skipped.len()));
        for failure in &report.skipped {
            output.push_str(&format!("  • {}\n", failure));
        }
    }

    let warnings: Vec<String> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .map(ToString::to_string)
        .collect();
    if !warnings.is_empty() {
        output.push_str(&format!("\nWarnings ({}):\n", warnings.len()));
        for warning in warnings {
            output.push_str(&format!("  • {}\n", warning));
        }
    }

    Ok(output)
}
