//! Mapping dbt semantic definitions to an Eppo sync payload
//!
//! [`map_sync_payload`] is a pure function: it takes the loaded and linked
//! definitions plus the compiled SQL and produces the payload, the items that
//! had to be left out, and the diagnostics collected on the way. It never
//! touches the filesystem or the network.
//!
//! Semantic models are mapped first, because metrics resolve their measures
//! against the fact sources that were actually produced. A metric whose
//! measure lives in a semantic model that failed to map is therefore dropped
//! as well.
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

pub mod fact_source;
pub mod filter;
pub(crate) mod meta;
pub mod metric;

pub use fact_source::{
    find_timestamp_column, map_primary_entity, map_semantic_model, MappedFactSource, ModelRecord,
    TIMESTAMP_NAMES,
};
pub use filter::{parse_filter, translate_filter, translate_filters, ParsedFilter};
pub use metric::{aggregation_operation, map_metric, MeasureRegistry, MetricShape};

use crate::batch::{Batch, ItemFailure, ItemKind};
use crate::diagnostics::{Diagnostics, Stage};
use crate::error::Result;
use crate::payload::SyncPayload;
use crate::types::{Metric, SemanticModel};
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Options that shape the payload
#[derive(Debug, Clone, Default)]
pub struct MappingOptions {
    /// Explicit sync tag; a timestamped default is generated when absent
    pub sync_tag: Option<String>,
    /// Base URL used to build reference URLs from definition file paths
    pub reference_url_base: Option<String>,
    /// Project root, stripped from definition file paths
    pub project_dir: Option<PathBuf>,
}

impl MappingOptions {
    /// Resolve the sync tag; a missing or blank tag gets the timestamped default
    pub fn resolve_sync_tag(&self) -> String {
        self.sync_tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_sync_tag)
    }

    /// `<base>/<file relative to the project>`, when a base is configured
    pub fn reference_url_for(&self, file: Option<&Path>) -> Option<String> {
        let base = self.reference_url_base.as_deref()?;
        let file = file?;
        let relative = self
            .project_dir
            .as_deref()
            .and_then(|dir| file.strip_prefix(dir).ok())
            .unwrap_or(file);

        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            relative.to_string_lossy().replace('\\', "/")
        ))
    }
}

/// `dbt-sync-<UTC timestamp>`
pub fn default_sync_tag() -> String {
    format!(
        "dbt-sync-{}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Result of mapping one project
#[derive(Debug, Clone)]
pub struct MappingOutcome {
    pub payload: SyncPayload,
    /// Semantic models and metrics left out of the payload
    pub failures: Vec<ItemFailure>,
    pub diagnostics: Diagnostics,
}

impl MappingOutcome {
    pub fn failures_of(&self, kind: ItemKind) -> impl Iterator<Item = &ItemFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }
}

/// Map linked definitions into a sync payload
#[instrument(skip_all, fields(metrics = metrics.len(), semantic_models = semantic_models.len()))]
pub fn map_sync_payload(
    metrics: &[Metric],
    semantic_models: &[SemanticModel],
    compiled_sql: &BTreeMap<String, String>,
    options: &MappingOptions,
) -> Result<MappingOutcome> {
    let sync_tag = options.resolve_sync_tag();
    let mut diagnostics = Diagnostics::new();

    let mut sources = Batch::new(ItemKind::SemanticModel);
    let mut registry = MeasureRegistry::new();

    for model in semantic_models {
        let Some(name) = model.name.as_deref() else {
            diagnostics.warn(Stage::Map, None, "Semantic model without a name skipped");
            continue;
        };
        let Some(node_id) = model.linked_node_id.as_deref() else {
            diagnostics.warn(
                Stage::Map,
                Some(name),
                "Semantic model is not linked to a manifest node; skipped",
            );
            continue;
        };
        let Some(sql) = compiled_sql.get(node_id) else {
            diagnostics.warn(
                Stage::Map,
                Some(name),
                format!("No compiled SQL for node '{}'; skipped", node_id),
            );
            continue;
        };

        let result = map_semantic_model(model, sql, options, &mut diagnostics);
        if let Some(mapped) = sources.record(name, result) {
            debug!(semantic_model = name, facts = mapped.fact_source.facts.len(), "Mapped fact source");
            registry.register(mapped.record.clone());
        }
    }

    let mut mapped_metrics = Batch::new(ItemKind::Metric);
    for metric in metrics {
        let Some(name) = metric.name.as_deref() else {
            diagnostics.warn(Stage::Map, None, "Metric without a name skipped");
            continue;
        };
        let result = map_metric(metric, &registry, options, &mut diagnostics);
        mapped_metrics.record(name, result);
    }

    let (sources, mut failures) = sources.into_parts();
    let (metrics, metric_failures) = mapped_metrics.into_parts();
    failures.extend(metric_failures);

    for failure in &failures {
        diagnostics.error(Stage::Map, Some(&failure.name), failure.reason.clone());
    }

    let payload = SyncPayload {
        sync_tag,
        fact_sources: sources.into_iter().map(|m| m.fact_source).collect(),
        metrics,
    };

    info!(
        sync_tag = %payload.sync_tag,
        fact_sources = payload.fact_sources.len(),
        metrics = payload.metrics.len(),
        skipped = failures.len(),
        "Payload mapped"
    );

    Ok(MappingOutcome {
        payload,
        failures,
        diagnostics,
    })
}
