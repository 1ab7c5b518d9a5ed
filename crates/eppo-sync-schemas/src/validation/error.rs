//! Error and violation types for payload validation
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single schema violation found in a payload
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Violation {
    /// Dot-delimited path into the payload, rooted at `$`
    pub path: String,
    /// Human-readable description of the failure
    pub message: String,
    /// JSON pointer of the schema keyword that failed
    pub rule: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validation Error at '{}': {} (rule: {})",
            self.path, self.message, self.rule
        )
    }
}

impl Violation {
    /// Create a new violation
    pub fn new<P, M, R>(path: P, message: M, rule: R) -> Self
    where
        P: Into<String>,
        M: Into<String>,
        R: Into<String>,
    {
        Self {
            path: path.into(),
            message: message.into(),
            rule: rule.into(),
        }
    }
}

/// Errors raised while loading or compiling a schema document
///
/// These are distinct from violations: a violation means the payload is
/// wrong, a `SchemaError` means the schema itself cannot be used.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document is not a valid draft-07 schema
    #[error("Schema Error: The provided Eppo schema is invalid. {message}")]
    InvalidSchema { message: String },

    /// The schema file could not be read
    #[error("Schema Error: failed to read schema file {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// The schema file is not well-formed JSON or YAML
    #[error("Schema Error: failed to parse schema file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display() {
        let violation = Violation::new(
            "$.fact_sources.0",
            "\"timestamp_column\" is a required property",
            "/definitions/fact_source/required",
        );
        assert_eq!(
            violation.to_string(),
            "Validation Error at '$.fact_sources.0': \"timestamp_column\" is a required property (rule: /definitions/fact_source/required)"
        );
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::InvalidSchema {
            message: "12 is not of type \"string\"".to_string(),
        };
        assert!(err.to_string().starts_with("Schema Error: The provided Eppo schema is invalid."));
    }
}
