//! Error types and handling for the CLI
//!
//! Every failure maps to exit code 1; the message is what distinguishes
//! them.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the sync pipeline
    #[error(transparent)]
    Core(#[from] eppo_sync_core::Error),

    /// The schema could not be loaded or compiled
    #[error(transparent)]
    Schema(#[from] eppo_sync_schemas::SchemaError),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// A saved payload does not satisfy the schema
    #[error("{} failed schema validation with {} violation(s)", path.display(), violations.len())]
    InvalidPayload {
        path: PathBuf,
        violations: Vec<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }

    /// Individual schema violations, when the error carries them
    pub fn violations(&self) -> &[String] {
        match self {
            Self::Core(eppo_sync_core::Error::Validation { violations }) => violations,
            Self::InvalidPayload { violations, .. } => violations,
            _ => &[],
        }
    }
}

/// Format an error for display to the user
///
/// Schema violations are listed one per line under the headline.
pub fn format_error(error: &Error, use_color: bool) -> String {
    use colored::Colorize;

    let mut message = if use_color {
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };

    for violation in error.violations() {
        message.push_str("\n  - ");
        message.push_str(violation);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_exits_with_one() {
        let errors = vec![
            Error::config("bad"),
            Error::invalid_args("bad"),
            Error::FileNotFound {
                path: PathBuf::from("missing.json"),
            },
            Error::Core(eppo_sync_core::Error::mapping("boom")),
            Error::Other(anyhow::anyhow!("boom")),
        ];
        for error in errors {
            assert_eq!(error.exit_code(), 1);
        }
    }

    #[test]
    fn test_format_error_lists_violations() {
        let error = Error::Core(eppo_sync_core::Error::Validation {
            violations: vec![
                "$.fact_sources.0: \"timestamp_column\" is a required property".to_string(),
                "$.metrics.1: bad".to_string(),
            ],
        });

        let formatted = format_error(&error, false);
        assert_eq!(
            formatted,
            "Error: Payload failed schema validation with 2 violation(s)\n  \
             - $.fact_sources.0: \"timestamp_column\" is a required property\n  \
             - $.metrics.1: bad"
        );
    }

    #[test]
    fn test_other_error_shows_context_chain() {
        let error: Error = anyhow::anyhow!("disk full")
            .context("Failed to write payload to out.json")
            .into();
        assert_eq!(
            error.to_string(),
            "Failed to write payload to out.json: disk full"
        );
    }

    #[test]
    fn test_help_hint_only_for_argument_errors() {
        assert!(Error::invalid_args("x").should_show_help());
        assert!(!Error::config("x").should_show_help());
    }
}
