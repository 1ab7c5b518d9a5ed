//! Schema resolution and loading
//!
//! The bundled schema is used unless an override file is given explicitly or
//! through the `EPPO_SYNC_SCHEMA_PATH` environment variable.

use crate::validation::error::{SchemaError, SchemaResult};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Environment variable holding a schema override path
pub const SCHEMA_PATH_ENV: &str = "EPPO_SYNC_SCHEMA_PATH";

const BUNDLED_SCHEMA: &str = include_str!("../schemas/eppo-metric-sync.schema.json");

/// Parse the schema compiled into this crate
pub fn bundled_schema() -> SchemaResult<Value> {
    serde_json::from_str(BUNDLED_SCHEMA).map_err(|e| SchemaError::InvalidSchema {
        message: format!("bundled schema is not valid JSON: {}", e),
    })
}

/// Pick the schema override path, explicit argument first
pub fn resolve_schema_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var(SCHEMA_PATH_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    })
}

/// Load the schema to validate against
///
/// Override files ending in `.yaml`/`.yml` are read as YAML, anything else
/// as JSON.
pub fn load_schema(explicit: Option<&Path>) -> SchemaResult<Value> {
    match resolve_schema_path(explicit) {
        Some(path) => load_schema_file(&path),
        None => bundled_schema(),
    }
}

fn load_schema_file(path: &Path) -> SchemaResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );

    let parsed = if is_yaml {
        serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| SchemaError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::PayloadValidator;
    use tempfile::tempdir;

    #[test]
    fn test_bundled_schema_compiles() {
        let schema = bundled_schema().unwrap();
        assert_eq!(schema["title"], "Eppo metrics sync payload");
        assert!(PayloadValidator::new(&schema).is_ok());
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"type": "object"}"#).unwrap();

        let schema = load_schema(Some(&path)).unwrap();
        assert_eq!(schema, serde_json::json!({"type": "object"}));
    }

    #[test]
    fn test_yaml_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, "type: object\nrequired: [sync_tag]\n").unwrap();

        let schema = load_schema(Some(&path)).unwrap();
        assert_eq!(schema["required"][0], "sync_tag");
    }

    #[test]
    fn test_missing_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(matches!(load_schema(Some(&path)), Err(SchemaError::Read { .. })));
    }

    #[test]
    fn test_malformed_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_schema(Some(&path)), Err(SchemaError::Parse { .. })));
    }
}
