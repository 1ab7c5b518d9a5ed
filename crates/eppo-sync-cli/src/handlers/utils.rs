//! Shared utilities for command handlers

use crate::config::is_yaml;
use crate::error::{Error, Result};
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read a JSON or YAML document, picking the parser from the extension
pub fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let (parsed, expected) = if is_yaml(path) {
        (serde_yaml::from_str(&content).ok(), "YAML")
    } else {
        (serde_json::from_str(&content).ok(), "JSON")
    };

    parsed.ok_or_else(|| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: expected.to_string(),
    })
}

/// Write a value as pretty JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, rendered)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
