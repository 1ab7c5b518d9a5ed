//! Error types for the eppo-sync core library
//!
//! Run-level failures are represented by [`Error`]; per-item failures inside
//! the mapper are carried as [`crate::batch::ItemFailure`] values instead and
//! never abort a run.

use crate::http::ClientError;
use eppo_sync_schemas::SchemaError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for eppo-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input files (manifest, definition YAML)
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Structural mapping failure for a semantic model, a metric, or the run
    #[error("Mapping error: {message}")]
    Mapping {
        message: String,
        subject: Option<String>,
    },

    /// The Eppo API call failed
    #[error("Eppo client error: {0}")]
    Client(#[from] ClientError),

    /// The target schema itself could not be loaded or compiled
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The payload does not satisfy the target schema
    #[error("Payload failed schema validation with {} violation(s)", .violations.len())]
    Validation { violations: Vec<String> },

    /// Invalid options (API key, base URL, timeouts)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a parse error without a file context
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create a parse error attributed to a file
    pub fn parse_at(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Create a mapping error for the run as a whole
    pub fn mapping(message: impl Into<String>) -> Self {
        Error::Mapping {
            message: message.into(),
            subject: None,
        }
    }

    /// Create a mapping error for a named semantic model or metric
    pub fn mapping_for(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Mapping {
            message: message.into(),
            subject: Some(subject.into()),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Short category name used in logs and reports
    pub fn category(&self) -> &'static str {
        match self {
            Error::Parse { .. } => "parse",
            Error::Mapping { .. } => "mapping",
            Error::Client(_) => "client",
            Error::Schema(_) => "schema",
            Error::Validation { .. } => "validation",
            Error::Configuration { .. } => "configuration",
            Error::Io { .. } => "io",
            Error::Json { .. } => "json",
            Error::Internal { .. } => "internal",
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
