//! Discovery and parsing of dbt definition YAML files
//!
//! Every `*.yml` / `*.yaml` file under the project directory is parsed. A
//! file that is not valid YAML aborts the load; items inside a valid file
//! that lack a `name` or cannot be read are dropped with a warning.

use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{Error, Result};
use crate::types::{Metric, SemanticModel};
use serde::de::DeserializeOwned;
use serde_yaml::Value as YamlValue;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Directories that hold build output or installed packages, not definitions
const SKIPPED_DIRS: &[&str] = &["target", "dbt_packages", "dbt_modules", "logs", "node_modules"];

/// Metrics and semantic models read from a project
#[derive(Debug, Default)]
pub struct DefinitionSet {
    pub metrics: Vec<Metric>,
    pub semantic_models: Vec<SemanticModel>,
    pub files_scanned: usize,
}

/// List the YAML files under `project_dir`, sorted by path
pub fn discover_definition_files(project_dir: &Path) -> Result<Vec<PathBuf>> {
    if !project_dir.is_dir() {
        return Err(Error::parse_at(
            project_dir,
            format!(
                "Provided YAML search path is not a directory: {}",
                project_dir.display()
            ),
        ));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(project_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry.map_err(|e| Error::Parse {
            message: format!("Failed to walk {}: {}", project_dir.display(), e),
            path: e.path().map(Path::to_path_buf),
            source: Some(anyhow::Error::new(e)),
        })?;

        if entry.file_type().is_file() && is_yaml_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    debug!("Discovered {} YAML file(s) under {}", files.len(), project_dir.display());
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// Load every metric and semantic model defined under `project_dir`
pub fn load_definitions(project_dir: &Path, diagnostics: &mut Diagnostics) -> Result<DefinitionSet> {
    let files = discover_definition_files(project_dir)?;
    let mut set = DefinitionSet::default();

    for file in &files {
        let Some(document) = read_yaml_document(file)? else {
            trace!("Skipping empty YAML file {}", file.display());
            continue;
        };
        set.files_scanned += 1;

        let mut metrics: Vec<Metric> = collect_items(&document, "metrics", file, diagnostics)?;
        for metric in &mut metrics {
            metric.source_file = Some(file.clone());
        }

        let mut models: Vec<SemanticModel> =
            collect_items(&document, "semantic_models", file, diagnostics)?;
        for model in &mut models {
            model.source_file = Some(file.clone());
        }

        set.metrics.extend(metrics);
        set.semantic_models.extend(models);
    }

    diagnostics.info(
        Stage::Load,
        None,
        format!(
            "Found {} metric(s) and {} semantic model(s) in {} YAML file(s)",
            set.metrics.len(),
            set.semantic_models.len(),
            set.files_scanned
        ),
    );
    Ok(set)
}

/// Parse one file; `None` for an empty document
fn read_yaml_document(path: &Path) -> Result<Option<YamlValue>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Parse {
        message: format!("Error reading YAML file {}: {}", path.display(), e),
        path: Some(path.to_path_buf()),
        source: Some(anyhow::Error::new(e)),
    })?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    let value: YamlValue = serde_yaml::from_str(&content).map_err(|e| Error::Parse {
        message: format!("Error parsing YAML file {}: {}", path.display(), e),
        path: Some(path.to_path_buf()),
        source: Some(anyhow::Error::new(e)),
    })?;

    Ok(match value {
        YamlValue::Null => None,
        other => Some(other),
    })
}

/// Collect the items of one top-level section (`metrics` or `semantic_models`)
fn collect_items<T: DeserializeOwned>(
    document: &YamlValue,
    section: &str,
    path: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<T>> {
    let file = path.display().to_string();
    let items = match document.get(section) {
        None | Some(YamlValue::Null) => return Ok(Vec::new()),
        Some(YamlValue::Sequence(items)) => items,
        Some(_) => {
            diagnostics.warn(
                Stage::Load,
                Some(&file),
                format!("Top-level '{}' is not a list; ignored", section),
            );
            return Ok(Vec::new());
        }
    };

    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let has_name = item
            .get("name")
            .and_then(YamlValue::as_str)
            .map(|name| !name.trim().is_empty())
            .unwrap_or(false);

        if !has_name {
            diagnostics.warn(
                Stage::Load,
                Some(&file),
                format!("Item {} of '{}' has no name; dropped", index, section),
            );
            continue;
        }

        match serde_yaml::from_value::<T>(item.clone()) {
            Ok(value) => parsed.push(value),
            Err(e) => {
                warn!(file = %file, index, "Skipping malformed {} item: {}", section, e);
                diagnostics.warn(
                    Stage::Load,
                    Some(&file),
                    format!("Item {} of '{}' could not be read ({}); dropped", index, section, e),
                );
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_path_must_be_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("schema.yml");
        std::fs::write(&file, "version: 2").unwrap();

        let err = discover_definition_files(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_discovery_is_recursive_sorted_and_skips_build_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("models/marts")).unwrap();
        std::fs::create_dir_all(root.join("target")).unwrap();
        std::fs::create_dir_all(root.join("dbt_packages/other")).unwrap();
        std::fs::write(root.join("models/marts/b.yaml"), "").unwrap();
        std::fs::write(root.join("models/a.yml"), "").unwrap();
        std::fs::write(root.join("models/readme.md"), "").unwrap();
        std::fs::write(root.join("target/compiled.yml"), "").unwrap();
        std::fs::write(root.join("dbt_packages/other/metrics.yml"), "").unwrap();

        let files = discover_definition_files(root).unwrap();
        let relative: Vec<PathBuf> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("models/a.yml"), PathBuf::from("models/marts/b.yaml")]
        );
    }

    #[test]
    fn test_invalid_yaml_aborts_load() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("good.yml"), "metrics: []").unwrap();
        std::fs::write(dir.path().join("invalid.yml"), "invalid: yaml: here").unwrap();

        let mut diagnostics = Diagnostics::new();
        let err = load_definitions(dir.path(), &mut diagnostics).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("Error parsing YAML file"));
        assert!(err.to_string().contains("invalid.yml"));
    }

    #[test]
    fn test_items_are_tagged_and_unnamed_dropped() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("schema.yml");
        std::fs::write(
            &file,
            r#"
semantic_models:
  - name: users
    model: ref('dim_users')
  - model: ref('anonymous')
metrics:
  - name: revenue
    type: sum
    measure: revenue
  - label: nameless
"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("empty.yml"), "").unwrap();

        let mut diagnostics = Diagnostics::new();
        let set = load_definitions(dir.path(), &mut diagnostics).unwrap();

        assert_eq!(set.files_scanned, 1);
        assert_eq!(set.semantic_models.len(), 1);
        assert_eq!(set.metrics.len(), 1);
        assert_eq!(set.semantic_models[0].source_file.as_deref(), Some(file.as_path()));
        assert_eq!(set.metrics[0].source_file.as_deref(), Some(file.as_path()));
        assert_eq!(diagnostics.warning_count(), 2);
    }

    #[test]
    fn test_unreadable_item_is_dropped_and_siblings_load() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("metrics.yml"),
            r#"
metrics:
  - name: revenue
    type: sum
    measure: revenue
  - name: launch_label
    label: 2024
    percentile: p95
  - name: orders
    type: count
    measure: orders
"#,
        )
        .unwrap();

        let mut diagnostics = Diagnostics::new();
        let set = load_definitions(dir.path(), &mut diagnostics).unwrap();

        let names: Vec<Option<&str>> = set.metrics.iter().map(|m| m.name.as_deref()).collect();
        assert_eq!(names, vec![Some("revenue"), Some("orders")]);
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(diagnostics.iter().any(|d| d.message.contains("Item 1 of 'metrics'")));
    }

    #[test]
    fn test_non_list_section_is_ignored() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("odd.yml"), "metrics: {name: revenue}").unwrap();

        let mut diagnostics = Diagnostics::new();
        let set = load_definitions(dir.path(), &mut diagnostics).unwrap();
        assert!(set.metrics.is_empty());
        assert_eq!(diagnostics.warning_count(), 1);
    }
}
