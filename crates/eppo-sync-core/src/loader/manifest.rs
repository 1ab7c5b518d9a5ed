//! Loading the compiled dbt manifest

use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{Error, Result};
use crate::types::Manifest;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Read and parse `manifest.json`
///
/// Fails with a parse error when the file is absent, unreadable, not JSON, or
/// not a JSON object.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    if !path.is_file() {
        return Err(Error::parse_at(
            path,
            format!("Manifest file not found at: {}", path.display()),
        ));
    }

    let content = std::fs::read_to_string(path).map_err(|e| Error::Parse {
        message: format!("Failed to read manifest {}: {}", path.display(), e),
        path: Some(path.to_path_buf()),
        source: Some(anyhow::Error::new(e)),
    })?;
    debug!("Manifest read, {} bytes", content.len());

    let value: Value = serde_json::from_str(&content).map_err(|e| Error::Parse {
        message: format!("Manifest {} is not valid JSON: {}", path.display(), e),
        path: Some(path.to_path_buf()),
        source: Some(anyhow::Error::new(e)),
    })?;

    if !value.is_object() {
        return Err(Error::parse_at(path, "Manifest content is not a valid JSON object"));
    }

    serde_json::from_value(value).map_err(|e| Error::Parse {
        message: format!("Manifest {} has an unexpected structure: {}", path.display(), e),
        path: Some(path.to_path_buf()),
        source: Some(anyhow::Error::new(e)),
    })
}

/// Map every model node's unique id to its compiled SQL
///
/// Model nodes without compiled SQL are skipped with a warning; they usually
/// mean `dbt compile` has not been run.
pub fn extract_compiled_sql(
    manifest: &Manifest,
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, String> {
    let mut compiled = BTreeMap::new();

    for (unique_id, node) in manifest.nodes.iter().filter(|(_, node)| node.is_model()) {
        match node.compiled_query() {
            Some(sql) => {
                compiled.insert(unique_id.clone(), sql.to_string());
            }
            None => diagnostics.warn(
                Stage::Load,
                Some(unique_id),
                "Model node has neither compiled_code nor compiled_sql; run `dbt compile` first",
            ),
        }
    }

    debug!("Extracted compiled SQL for {} model node(s)", compiled.len());
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_manifest(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let err = load_manifest(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("Manifest file not found at"));
    }

    #[test]
    fn test_manifest_not_an_object() {
        let (_dir, path) = write_manifest("[1, 2, 3]");
        let err = load_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("not a valid JSON object"));
    }

    #[test]
    fn test_manifest_invalid_json() {
        let (_dir, path) = write_manifest("{ nodes: ");
        assert!(matches!(load_manifest(&path), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_extract_compiled_sql() {
        let (_dir, path) = write_manifest(
            r#"{
                "metadata": {"project_name": "test_project"},
                "nodes": {
                    "model.test_project.my_model": {"resource_type": "model", "name": "my_model", "compiled_code": "SELECT 1"},
                    "model.test_project.legacy": {"resource_type": "model", "name": "legacy", "compiled_sql": "SELECT 2"},
                    "model.test_project.uncompiled": {"resource_type": "model", "name": "uncompiled"},
                    "test.test_project.not_null": {"resource_type": "test", "name": "not_null", "compiled_code": "SELECT 3"}
                }
            }"#,
        );
        let manifest = load_manifest(&path).unwrap();
        let mut diagnostics = Diagnostics::new();
        let compiled = extract_compiled_sql(&manifest, &mut diagnostics);

        assert_eq!(compiled.len(), 2);
        assert_eq!(compiled["model.test_project.my_model"], "SELECT 1");
        assert_eq!(compiled["model.test_project.legacy"], "SELECT 2");
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(diagnostics.mentions("model.test_project.uncompiled", "compiled"));
    }
}
