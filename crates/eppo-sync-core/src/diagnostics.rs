//! Structured diagnostics collected while a sync runs
//!
//! Every component returns its warnings alongside its result instead of
//! printing them. Each recorded entry is also emitted through `tracing`, so
//! log output and the collected list always agree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Something was skipped or defaulted and should be reviewed
    Warning,
    /// An item failed and was left out of the payload
    Error,
}

/// Pipeline stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Link,
    Map,
    Validate,
    Submit,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Load => write!(f, "load"),
            Stage::Link => write!(f, "link"),
            Stage::Map => write!(f, "map"),
            Stage::Validate => write!(f, "validate"),
            Stage::Submit => write!(f, "submit"),
        }
    }
}

/// One recorded diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    /// Name of the semantic model, metric, node or file concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "[{}] {}: {}", self.stage, subject, self.message),
            None => write!(f, "[{}] {}", self.stage, self.message),
        }
    }
}

/// Collector for diagnostics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational entry
    pub fn info(&mut self, stage: Stage, subject: Option<&str>, message: impl Into<String>) {
        self.record(Severity::Info, stage, subject, message.into());
    }

    /// Record a warning
    pub fn warn(&mut self, stage: Stage, subject: Option<&str>, message: impl Into<String>) {
        self.record(Severity::Warning, stage, subject, message.into());
    }

    /// Record an item-level error
    pub fn error(&mut self, stage: Stage, subject: Option<&str>, message: impl Into<String>) {
        self.record(Severity::Error, stage, subject, message.into());
    }

    fn record(&mut self, severity: Severity, stage: Stage, subject: Option<&str>, message: String) {
        let subject_field = subject.unwrap_or("");
        match severity {
            Severity::Info => tracing::info!(stage = %stage, subject = subject_field, "{}", message),
            Severity::Warning => tracing::warn!(stage = %stage, subject = subject_field, "{}", message),
            Severity::Error => tracing::error!(stage = %stage, subject = subject_field, "{}", message),
        }

        self.items.push(Diagnostic {
            severity,
            stage,
            subject: subject.map(str::to_string),
            message,
        });
    }

    /// Append entries collected elsewhere without logging them again
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries at or above the given severity
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.severity >= severity)
    }

    /// Entries produced by one stage
    pub fn for_stage(&self, stage: Stage) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.stage == stage)
    }

    /// Number of warnings and errors
    pub fn warning_count(&self) -> usize {
        self.at_least(Severity::Warning).count()
    }

    /// Whether any entry for `subject` mentions `needle`
    pub fn mentions(&self, subject: &str, needle: &str) -> bool {
        self.items
            .iter()
            .any(|d| d.subject.as_deref() == Some(subject) && d.message.contains(needle))
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_filter() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.info(Stage::Load, None, "Found 3 definition files");
        diagnostics.warn(Stage::Link, Some("orders"), "No manifest node named 'orders'");
        diagnostics.error(Stage::Map, Some("revenue"), "Measure not found");

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.warning_count(), 2);
        assert_eq!(diagnostics.for_stage(Stage::Link).count(), 1);
        assert!(diagnostics.mentions("orders", "No manifest node"));
        assert!(!diagnostics.mentions("revenue", "No manifest node"));
    }

    #[test]
    fn test_display() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(Stage::Map, Some("users"), "Dimension without expr dropped");
        diagnostics.info(Stage::Load, None, "done");

        let rendered: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
        assert_eq!(rendered[0], "[map] users: Dimension without expr dropped");
        assert_eq!(rendered[1], "[load] done");
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut first = Diagnostics::new();
        first.warn(Stage::Load, None, "one");
        let mut second = Diagnostics::new();
        second.warn(Stage::Map, None, "two");

        first.extend(second);
        let messages: Vec<&str> = first.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
