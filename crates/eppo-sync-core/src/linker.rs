//! Linking semantic models to manifest nodes
//!
//! A semantic model names its upstream model with `ref('name')` or
//! `ref('package', 'name')`. The linker extracts the bare name and finds the
//! matching `model` node in the manifest.
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

use crate::diagnostics::{Diagnostics, Stage};
use crate::types::{Manifest, SemanticModel};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

static REF_PATTERN: OnceLock<Regex> = OnceLock::new();

fn ref_pattern() -> &'static Regex {
    REF_PATTERN.get_or_init(|| {
        Regex::new(r#"ref\(\s*(?:['"][\w.]+['"]\s*,\s*)?['"]([\w.]+)['"]\s*\)"#)
            .expect("ref pattern is a valid regex")
    })
}

/// Extract the model name from a `ref(...)` expression
pub fn extract_ref_name(reference: &str) -> Option<String> {
    ref_pattern()
        .captures(reference)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Result of looking up a model name in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeResolution {
    /// A node owned by the current project
    Exact(String),
    /// No node of the current project; the lexically first candidate
    Fallback {
        unique_id: String,
        candidates: Vec<String>,
    },
    /// No model node with this name
    Missing,
}

impl NodeResolution {
    pub fn unique_id(&self) -> Option<&str> {
        match self {
            NodeResolution::Exact(id) => Some(id),
            NodeResolution::Fallback { unique_id, .. } => Some(unique_id),
            NodeResolution::Missing => None,
        }
    }
}

/// Find the manifest node for a model name
///
/// A node owned by the current project wins immediately. Otherwise the first
/// matching node in unique-id order is used.
pub fn resolve_model_node(manifest: &Manifest, model_name: &str) -> NodeResolution {
    let project = manifest.project_name();
    let mut candidates = Vec::new();

    for (unique_id, node) in &manifest.nodes {
        if !node.is_model() || node.name.as_deref() != Some(model_name) {
            continue;
        }
        if project.is_some() && node.package_name.as_deref() == project {
            return NodeResolution::Exact(unique_id.clone());
        }
        candidates.push(unique_id.clone());
    }

    match candidates.first() {
        Some(first) => NodeResolution::Fallback {
            unique_id: first.clone(),
            candidates,
        },
        None => NodeResolution::Missing,
    }
}

/// Unique id of the manifest node for a model name, if any
pub fn find_model_unique_id(manifest: &Manifest, model_name: &str) -> Option<String> {
    resolve_model_node(manifest, model_name)
        .unique_id()
        .map(str::to_string)
}

/// Link a single semantic model; returns whether it was linked
pub fn link_semantic_model(
    model: &mut SemanticModel,
    manifest: &Manifest,
    diagnostics: &mut Diagnostics,
) -> bool {
    let subject = model.name.clone().unwrap_or_else(|| "<unnamed>".to_string());

    let Some(reference) = model.model.as_deref() else {
        diagnostics.warn(
            Stage::Link,
            Some(&subject),
            "Semantic model has no 'model' reference; cannot link",
        );
        return false;
    };

    let Some(model_name) = extract_ref_name(reference) else {
        diagnostics.warn(
            Stage::Link,
            Some(&subject),
            format!("Could not parse model reference '{}'", reference),
        );
        return false;
    };

    match resolve_model_node(manifest, &model_name) {
        NodeResolution::Exact(unique_id) => {
            debug!(semantic_model = %subject, node = %unique_id, "Linked semantic model");
            model.linked_node_id = Some(unique_id);
            true
        }
        NodeResolution::Fallback {
            unique_id,
            candidates,
        } => {
            if candidates.len() > 1 {
                diagnostics.warn(
                    Stage::Link,
                    Some(&subject),
                    format!(
                        "Model '{}' matches {} nodes outside the current project ({}); using {}",
                        model_name,
                        candidates.len(),
                        candidates.join(", "),
                        unique_id
                    ),
                );
            }
            debug!(semantic_model = %subject, node = %unique_id, "Linked semantic model to a foreign package");
            model.linked_node_id = Some(unique_id);
            true
        }
        NodeResolution::Missing => {
            diagnostics.warn(
                Stage::Link,
                Some(&subject),
                format!("No manifest model node named '{}'", model_name),
            );
            false
        }
    }
}

/// Link every semantic model; returns the number linked
pub fn link_semantic_models(
    models: &mut [SemanticModel],
    manifest: &Manifest,
    diagnostics: &mut Diagnostics,
) -> usize {
    models
        .iter_mut()
        .map(|model| link_semantic_model(model, manifest, diagnostics))
        .filter(|linked| *linked)
        .count()
}
