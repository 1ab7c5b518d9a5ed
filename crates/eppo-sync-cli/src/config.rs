//! Configuration management for the CLI
//!
//! Settings are resolved in this order, first match wins:
//! - Command-line arguments
//! - Environment variables (`EPPO_API_KEY`, `EPPO_BASE_URL`, `.env` included)
//! - Configuration file (YAML/JSON)
//! - Default values
//!
//! clap folds the first two together; this module supplies the last two.

use crate::error::{Error, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Eppo API settings
    pub eppo: EppoSettings,

    /// Sync defaults
    pub sync: SyncSettings,

    /// Output settings
    pub output: OutputSettings,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Eppo API settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EppoSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Connect timeout in seconds
    pub connect_timeout_secs: Option<u64>,
}

/// Defaults for the sync command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub sync_tag: Option<String>,
    pub schema_path: Option<PathBuf>,
    pub reference_url_base: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Use colored output when the terminal supports it (default: true)
    pub color: Option<bool>,

    /// Show a spinner during the network call (default: true)
    pub progress: Option<bool>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level or filter directive (used when no `-v` flag is given)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl OutputSettings {
    pub fn color(&self) -> bool {
        self.color.unwrap_or(true)
    }

    pub fn progress(&self) -> bool {
        self.progress.unwrap_or(true)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| {
                Error::config(format!("Invalid YAML in {}: {}", path.display(), e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                Error::config(format!("Invalid JSON in {}: {}", path.display(), e))
            })?
        };

        Ok(config)
    }

    /// Load configuration from the default locations
    ///
    /// Every file that exists is merged; earlier paths win.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        for path in Self::default_config_paths().iter().rev() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Merging config file");
                config.merge(Self::from_file(path)?);
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific file or default locations
    ///
    /// An explicit file must exist.
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) if !path.exists() => Err(Error::FileNotFound {
                path: path.to_path_buf(),
            }),
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Default configuration file paths to check, in order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".eppo-sync.yaml"),
            PathBuf::from(".eppo-sync.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("eppo-sync").join("config.yaml"));
        }

        paths
    }

    /// Merge with another config (set values in `other` take precedence)
    pub fn merge(&mut self, other: Config) {
        let Config {
            eppo,
            sync,
            output,
            logging,
        } = other;

        override_with(&mut self.eppo.base_url, eppo.base_url);
        override_with(&mut self.eppo.api_key, eppo.api_key);
        override_with(&mut self.eppo.timeout_secs, eppo.timeout_secs);
        override_with(&mut self.eppo.connect_timeout_secs, eppo.connect_timeout_secs);

        override_with(&mut self.sync.sync_tag, sync.sync_tag);
        override_with(&mut self.sync.schema_path, sync.schema_path);
        override_with(&mut self.sync.reference_url_base, sync.reference_url_base);

        override_with(&mut self.output.color, output.color);
        override_with(&mut self.output.progress, output.progress);

        override_with(&mut self.logging.level, logging.level);
        override_with(&mut self.logging.format, logging.format);
    }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// First value that is set and not blank
pub fn first_set(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

/// Whether a path names a YAML file
pub fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_from_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".eppo-sync.yaml");
        std::fs::write(
            &path,
            "eppo:\n  base_url: https://eppo.example.com\n  timeout_secs: 60\nsync:\n  sync_tag: nightly\nlogging:\n  format: json\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.eppo.base_url.as_deref(), Some("https://eppo.example.com"));
        assert_eq!(config.eppo.timeout_secs, Some(60));
        assert_eq!(config.eppo.api_key, None);
        assert_eq!(config.sync.sync_tag.as_deref(), Some("nightly"));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(config.output, OutputSettings::default());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"sync": {"reference_url_base": "https://github.com/acme/shop/blob/main"}, "output": {"color": false}}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.sync.reference_url_base.as_deref(),
            Some("https://github.com/acme/shop/blob/main")
        );
        assert!(!config.output.color());
        assert!(config.output.progress());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "eppo: [unterminated").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Invalid YAML"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(matches!(
            Config::load_with_file(Some(&path)),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_merge_keeps_unset_values() {
        let mut base = Config::default();
        base.eppo.api_key = Some("from-base".to_string());
        base.eppo.timeout_secs = Some(10);
        base.sync.sync_tag = Some("base-tag".to_string());

        let mut other = Config::default();
        other.eppo.timeout_secs = Some(90);
        other.logging.level = Some("debug".to_string());
        other.output.color = Some(false);

        base.merge(other);
        assert!(!base.output.color());
        assert_eq!(base.eppo.api_key.as_deref(), Some("from-base"));
        assert_eq!(base.eppo.timeout_secs, Some(90));
        assert_eq!(base.sync.sync_tag.as_deref(), Some("base-tag"));
        assert_eq!(base.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_first_set_skips_blank_values() {
        assert_eq!(
            first_set([None, Some("  ".to_string()), Some("file".to_string())]),
            Some("file".to_string())
        );
        assert_eq!(first_set([None, None]), None);
    }

    #[test]
    fn test_default_paths_start_in_current_directory() {
        let paths = Config::default_config_paths();
        assert_eq!(paths[0], PathBuf::from(".eppo-sync.yaml"));
        assert_eq!(paths[1], PathBuf::from(".eppo-sync.json"));
    }
}
