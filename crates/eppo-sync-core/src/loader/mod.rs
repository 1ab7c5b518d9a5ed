//! Artifact loading: the compiled manifest plus definition YAML
//!
//! [`load_project`] is the Load stage of a sync. It reads the manifest,
//! extracts compiled SQL for model nodes, reads every definition file and
//! links each semantic model to its manifest node.

pub mod definitions;
pub mod manifest;

pub use definitions::{discover_definition_files, load_definitions, DefinitionSet};
pub use manifest::{extract_compiled_sql, load_manifest};

use crate::diagnostics::{Diagnostics, Stage};
use crate::error::Result;
use crate::linker::link_semantic_models;
use crate::types::{Metric, SemanticModel};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

/// Everything the mapper needs, read from one project
#[derive(Debug, Default)]
pub struct ProjectArtifacts {
    pub metrics: Vec<Metric>,
    /// Semantic models, already linked where possible
    pub semantic_models: Vec<SemanticModel>,
    /// Manifest unique id to compiled SQL
    pub compiled_sql: BTreeMap<String, String>,
    pub project_name: Option<String>,
    pub diagnostics: Diagnostics,
}

impl ProjectArtifacts {
    /// Number of semantic models whose linked node has compiled SQL
    pub fn models_with_sql(&self) -> usize {
        self.semantic_models
            .iter()
            .filter(|model| {
                model
                    .linked_node_id
                    .as_ref()
                    .is_some_and(|id| self.compiled_sql.contains_key(id))
            })
            .count()
    }
}

/// Load and link all artifacts of a dbt project
#[instrument(skip_all, fields(project_dir = %project_dir.display(), manifest = %manifest_path.display()))]
pub fn load_project(project_dir: &Path, manifest_path: &Path) -> Result<ProjectArtifacts> {
    let mut diagnostics = Diagnostics::new();

    let manifest = load_manifest(manifest_path)?;
    let compiled_sql = extract_compiled_sql(&manifest, &mut diagnostics);

    let DefinitionSet {
        metrics,
        mut semantic_models,
        ..
    } = load_definitions(project_dir, &mut diagnostics)?;

    let linked = link_semantic_models(&mut semantic_models, &manifest, &mut diagnostics);

    let mut artifacts = ProjectArtifacts {
        metrics,
        semantic_models,
        compiled_sql,
        project_name: manifest.project_name().map(str::to_string),
        diagnostics,
    };

    let with_sql = artifacts.models_with_sql();
    if linked > with_sql {
        artifacts.diagnostics.warn(
            Stage::Load,
            None,
            format!("{} linked semantic model(s) have no compiled SQL", linked - with_sql),
        );
    }

    info!(
        metrics = artifacts.metrics.len(),
        semantic_models = artifacts.semantic_models.len(),
        linked,
        with_sql,
        "Project artifacts loaded"
    );
    Ok(artifacts)
}
