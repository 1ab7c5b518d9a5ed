//! Semantic model to fact source mapping
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{Error, Result};
use crate::mapping::meta::{self, MetaView};
use crate::mapping::MappingOptions;
use crate::payload::{DesiredChange, Fact, FactProperty, FactSource, FactSourceEntity};
use crate::types::{Dimension, Measure, SemanticModel};

/// Dimension names recognized as timestamps when no dimension has type `time`
pub const TIMESTAMP_NAMES: &[&str] = &["timestamp", "event_timestamp", "ts", "created_at", "updated_at"];

/// What the metric pass needs to know about a mapped semantic model
#[derive(Debug, Clone)]
pub struct ModelRecord {
    pub name: String,
    pub primary_entity: String,
    pub properties: Vec<FactProperty>,
    pub measures: Vec<Measure>,
}

impl ModelRecord {
    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name.as_deref() == Some(name))
    }
}

/// A fact source together with its record
#[derive(Debug, Clone)]
pub struct MappedFactSource {
    pub fact_source: FactSource,
    pub record: ModelRecord,
}

/// Map the primary entity
///
/// The first entity of kind `primary` that has both a name and an
/// expression is used.
pub fn map_primary_entity(model: &SemanticModel) -> Result<FactSourceEntity> {
    let name = model.name.as_deref().unwrap_or("<unnamed>");
    model
        .entities
        .iter()
        .filter(|entity| entity.is_primary())
        .find_map(|entity| match (&entity.name, &entity.expr) {
            (Some(entity_name), Some(column)) => Some(FactSourceEntity {
                entity_name: entity_name.clone(),
                column: column.clone(),
            }),
            _ => None,
        })
        .ok_or_else(|| {
            Error::mapping_for(
                name,
                format!(
                    "Semantic model '{}' has no primary entity with both a name and an expr",
                    name
                ),
            )
        })
}

/// Find the timestamp column
///
/// The first `time` dimension wins; failing that, the first dimension whose
/// name is one of [`TIMESTAMP_NAMES`]. Dimensions without an expression are
/// never considered.
pub fn find_timestamp_column(dimensions: &[Dimension]) -> Option<&str> {
    let usable = || dimensions.iter().filter(|d| d.expr.is_some());

    usable()
        .find(|d| d.is_time())
        .or_else(|| {
            usable().find(|d| {
                d.name
                    .as_deref()
                    .is_some_and(|name| TIMESTAMP_NAMES.contains(&name))
            })
        })
        .and_then(|d| d.expr.as_deref())
}

fn map_facts(model_name: &str, measures: &[Measure], diagnostics: &mut Diagnostics) -> Vec<Fact> {
    let mut facts = Vec::with_capacity(measures.len());

    for (index, measure) in measures.iter().enumerate() {
        let Some(name) = measure.name.as_deref() else {
            diagnostics.warn(
                Stage::Map,
                Some(model_name),
                format!("Measure {} has no name; dropped", index),
            );
            continue;
        };

        let view = MetaView::new(measure.meta_sources());
        let desired_change = view
            .string(meta::DESIRED_CHANGE, diagnostics, name)
            .and_then(|value| DesiredChange::from_literal(&value));

        facts.push(Fact {
            name: name.to_string(),
            column: measure.expr.clone(),
            description: measure.description.clone().unwrap_or_default(),
            desired_change,
        });
    }

    facts
}

fn map_properties(
    model_name: &str,
    dimensions: &[Dimension],
    diagnostics: &mut Diagnostics,
) -> Vec<FactProperty> {
    let mut properties = Vec::with_capacity(dimensions.len());

    for (index, dimension) in dimensions.iter().enumerate() {
        match (&dimension.name, &dimension.expr) {
            (Some(name), Some(column)) => properties.push(FactProperty {
                name: name.clone(),
                column: column.clone(),
                description: dimension.description.clone().unwrap_or_default(),
            }),
            (name, _) => diagnostics.warn(
                Stage::Map,
                Some(model_name),
                format!(
                    "Dimension {} lacks a name or expr; not exported as a property",
                    name.as_deref().map(|n| format!("'{}'", n)).unwrap_or_else(|| index.to_string())
                ),
            ),
        }
    }

    properties
}

/// Map one linked semantic model with its compiled SQL
///
/// Fails when the model has no usable primary entity or timestamp column.
pub fn map_semantic_model(
    model: &SemanticModel,
    sql: &str,
    options: &MappingOptions,
    diagnostics: &mut Diagnostics,
) -> Result<MappedFactSource> {
    let name = model
        .name
        .clone()
        .ok_or_else(|| Error::mapping("Semantic model has no name"))?;

    let entity = map_primary_entity(model)?;
    let facts = map_facts(&name, &model.measures, diagnostics);
    let properties = map_properties(&name, &model.dimensions, diagnostics);

    let timestamp_column = find_timestamp_column(&model.dimensions)
        .ok_or_else(|| {
            Error::mapping_for(
                &name,
                format!(
                    "Could not automatically identify a required timestamp column for semantic model '{}'. \
                     Ensure a dimension has type 'time' or one of the names: {}",
                    name,
                    TIMESTAMP_NAMES.join(", ")
                ),
            )
        })?
        .to_string();

    let view = MetaView::new(model.meta_sources());
    let reference_url = view
        .string(meta::REFERENCE_URL, diagnostics, &name)
        .or_else(|| options.reference_url_for(model.source_file.as_deref()));
    let always_full_refresh = view.boolean(meta::ALWAYS_FULL_REFRESH, diagnostics, &name);

    let record = ModelRecord {
        name: name.clone(),
        primary_entity: entity.entity_name.clone(),
        properties: properties.clone(),
        measures: model.measures.clone(),
    };

    Ok(MappedFactSource {
        fact_source: FactSource {
            name,
            sql: sql.to_string(),
            timestamp_column,
            entities: vec![entity],
            facts,
            properties,
            reference_url,
            always_full_refresh,
        },
        record,
    })
}
