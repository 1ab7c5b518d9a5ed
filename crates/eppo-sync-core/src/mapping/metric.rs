//! Metric mapping
//!
//! Each dbt metric is classified once into a [`MetricShape`]; the rest of
//! the mapping matches on that shape instead of re-inspecting the raw
//! definition.

use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{Error, Result};
use crate::mapping::fact_source::ModelRecord;
use crate::mapping::filter::translate_filters;
use crate::mapping::meta::{self, MetaView};
use crate::mapping::MappingOptions;
use crate::payload::{Aggregation, EppoMetric, FactFilter, MetricType, Operation, PercentileAggregation};
use crate::types::{AggregationKind, FilterExpr, MeasureRef, Metric, MetricKind};
use std::collections::HashMap;

/// Target shape of a metric, decided once per metric
#[derive(Debug, Clone, PartialEq)]
pub enum MetricShape {
    /// One aggregated fact; `implicit` when no kind was declared
    Simple { measure: MeasureRef, implicit: bool },
    /// Numerator over denominator
    Ratio {
        numerator: MeasureRef,
        denominator: MeasureRef,
    },
    /// Sum over count of the same fact
    Average { measure: MeasureRef },
    /// A percentile of one fact
    Percentile { measure: MeasureRef, percentile: f64 },
}

impl MetricShape {
    /// Classify a metric definition
    pub fn classify(metric: &Metric) -> Result<Self> {
        let name = metric.name.as_deref().unwrap_or("<unnamed>");
        let kind = metric.kind();
        let primary = metric
            .measure_ref()
            .or_else(|| metric.numerator().map(|n| &n.measure))
            .cloned();
        let missing_primary = || {
            Error::mapping_for(
                name,
                format!("Missing primary 'measure' reference in metric '{}' or its numerator", name),
            )
        };

        let has_both_inputs = metric.numerator().is_some() && metric.denominator().is_some();

        match kind {
            Some(MetricKind::Ratio) => {
                let numerator = primary.ok_or_else(missing_primary)?;
                let denominator = metric
                    .denominator()
                    .map(|d| d.measure.clone())
                    .ok_or_else(|| {
                        Error::mapping_for(
                            name,
                            format!("Ratio metric '{}' is missing a denominator measure reference", name),
                        )
                    })?;
                Ok(MetricShape::Ratio {
                    numerator,
                    denominator,
                })
            }
            Some(MetricKind::Derived) if has_both_inputs => {
                let numerator = primary.ok_or_else(missing_primary)?;
                let denominator = metric
                    .denominator()
                    .map(|d| d.measure.clone())
                    .ok_or_else(missing_primary)?;
                Ok(MetricShape::Ratio {
                    numerator,
                    denominator,
                })
            }
            Some(
                MetricKind::Simple
                | MetricKind::Sum
                | MetricKind::Count
                | MetricKind::CountDistinct
                | MetricKind::Median,
            ) => Ok(MetricShape::Simple {
                measure: primary.ok_or_else(missing_primary)?,
                implicit: false,
            }),
            Some(MetricKind::Average) => Ok(MetricShape::Average {
                measure: primary.ok_or_else(missing_primary)?,
            }),
            Some(MetricKind::Percentile) => {
                let measure = primary.ok_or_else(missing_primary)?;
                let percentile = metric.percentile_value().ok_or_else(|| {
                    Error::mapping_for(
                        name,
                        format!("Percentile metric '{}' has no 'percentile' value", name),
                    )
                })?;
                if !(percentile > 0.0 && percentile <= 1.0) {
                    return Err(Error::mapping_for(
                        name,
                        format!(
                            "Percentile metric '{}' has percentile {}; expected a value in (0, 1]",
                            name, percentile
                        ),
                    ));
                }
                Ok(MetricShape::Percentile {
                    measure,
                    percentile,
                })
            }
            Some(MetricKind::Derived) if metric.measure_ref().is_some() => Ok(MetricShape::Simple {
                measure: primary.ok_or_else(missing_primary)?,
                implicit: false,
            }),
            _ => match metric.measure_ref() {
                Some(measure) => Ok(MetricShape::Simple {
                    measure: measure.clone(),
                    implicit: true,
                }),
                None => Err(Error::mapping_for(
                    name,
                    format!(
                        "Cannot determine target metric kind for metric '{}' (type: {})",
                        name,
                        kind.map(ToString::to_string).unwrap_or_else(|| "none".to_string())
                    ),
                )),
            },
        }
    }

    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricShape::Simple { .. } => MetricType::Simple,
            MetricShape::Ratio { .. } | MetricShape::Average { .. } => MetricType::Ratio,
            MetricShape::Percentile { .. } => MetricType::Percentile,
        }
    }

    /// The measure that decides the owning semantic model and entity
    pub fn primary_measure(&self) -> &MeasureRef {
        match self {
            MetricShape::Simple { measure, .. }
            | MetricShape::Average { measure }
            | MetricShape::Percentile { measure, .. } => measure,
            MetricShape::Ratio { numerator, .. } => numerator,
        }
    }
}

/// Map a measure aggregation onto an Eppo operation
pub fn aggregation_operation(measure_name: &str, agg: Option<&AggregationKind>) -> Result<Operation> {
    match agg {
        Some(AggregationKind::Sum) => Ok(Operation::Sum),
        Some(AggregationKind::Count) => Ok(Operation::Count),
        Some(AggregationKind::CountDistinct) => Ok(Operation::DistinctEntity),
        Some(AggregationKind::Average) => Err(Error::mapping_for(
            measure_name,
            format!(
                "Measure '{}' uses an average aggregation, which Eppo expresses as a ratio; \
                 declare the metric with type 'average' instead",
                measure_name
            ),
        )),
        Some(AggregationKind::Other(other)) => Err(Error::mapping_for(
            measure_name,
            format!("Unsupported dbt aggregation '{}' on measure '{}'", other, measure_name),
        )),
        None => Err(Error::mapping_for(
            measure_name,
            format!("Measure '{}' has no aggregation type", measure_name),
        )),
    }
}

/// Measure name to owning semantic model, first mapped model wins
#[derive(Debug, Default)]
pub struct MeasureRegistry {
    models: Vec<ModelRecord>,
    by_measure: HashMap<String, usize>,
}

/// A measure resolved to its fact
#[derive(Debug, Clone, Copy)]
pub struct ResolvedMeasure<'a> {
    pub model: &'a ModelRecord,
    pub fact_name: &'a str,
    pub agg: Option<&'a AggregationKind>,
}

impl MeasureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapped semantic model and its measures
    pub fn register(&mut self, record: ModelRecord) {
        let index = self.models.len();
        for measure in &record.measures {
            if let Some(name) = measure.name.as_ref() {
                self.by_measure.entry(name.clone()).or_insert(index);
            }
        }
        self.models.push(record);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolve a measure name; the fact name equals the measure name
    pub fn resolve(&self, measure_name: &str) -> Option<ResolvedMeasure<'_>> {
        let model = self.models.get(*self.by_measure.get(measure_name)?)?;
        let measure = model.measure(measure_name)?;
        Some(ResolvedMeasure {
            model,
            fact_name: measure.name.as_deref()?,
            agg: measure.agg(),
        })
    }

    fn resolve_for(&self, metric_name: &str, measure: &MeasureRef) -> Result<ResolvedMeasure<'_>> {
        self.resolve(&measure.name).ok_or_else(|| {
            Error::mapping_for(
                metric_name,
                format!(
                    "Measure '{}' referenced by metric '{}' was not found in any mapped semantic model",
                    measure.name, metric_name
                ),
            )
        })
    }
}

/// Metric-level filter, falling back to the numerator's or measure's filter
fn metric_filter<'a>(metric: &'a Metric, shape: &'a MetricShape) -> Option<&'a FilterExpr> {
    metric
        .filter
        .as_ref()
        .or_else(|| metric.numerator().and_then(|n| n.filter.as_ref()))
        .or(shape.primary_measure().filter.as_ref())
}

fn aggregation(fact_name: &str, operation: Operation, filters: &[FactFilter]) -> Aggregation {
    Aggregation {
        fact_name: fact_name.to_string(),
        operation,
        filters: filters.to_vec(),
    }
}

/// Map one dbt metric into an Eppo metric
pub fn map_metric(
    metric: &Metric,
    registry: &MeasureRegistry,
    options: &MappingOptions,
    diagnostics: &mut Diagnostics,
) -> Result<EppoMetric> {
    let name = metric
        .name
        .as_deref()
        .ok_or_else(|| Error::mapping("Metric has no name"))?;

    let shape = MetricShape::classify(metric)?;
    if let MetricShape::Simple { implicit: true, .. } = shape {
        diagnostics.warn(
            Stage::Map,
            Some(name),
            format!(
                "Metric type '{}' is not mapped explicitly; treating it as a simple metric on its measure",
                metric.kind().map(ToString::to_string).unwrap_or_else(|| "none".to_string())
            ),
        );
    }

    let primary = registry.resolve_for(name, shape.primary_measure())?;
    let entity = primary.model.primary_entity.clone();
    if entity.is_empty() {
        return Err(Error::mapping_for(
            name,
            format!("Semantic model '{}' has no primary entity for metric '{}'", primary.model.name, name),
        ));
    }

    let filters = translate_filters(
        metric_filter(metric, &shape),
        &primary.model.properties,
        diagnostics,
        name,
    );

    let (numerator, denominator, percentile) = match &shape {
        MetricShape::Simple { .. } => {
            let operation = aggregation_operation(primary.fact_name, primary.agg)?;
            (Some(aggregation(primary.fact_name, operation, &filters)), None, None)
        }
        MetricShape::Average { .. } => (
            Some(aggregation(primary.fact_name, Operation::Sum, &filters)),
            Some(aggregation(primary.fact_name, Operation::Count, &filters)),
            None,
        ),
        MetricShape::Ratio { denominator, .. } => {
            let operation = aggregation_operation(primary.fact_name, primary.agg)?;
            let resolved = registry.resolve_for(name, denominator)?;
            let denominator_operation = aggregation_operation(resolved.fact_name, resolved.agg)?;
            (
                Some(aggregation(primary.fact_name, operation, &filters)),
                Some(aggregation(resolved.fact_name, denominator_operation, &filters)),
                None,
            )
        }
        MetricShape::Percentile { percentile, .. } => (
            None,
            None,
            Some(PercentileAggregation {
                fact_name: primary.fact_name.to_string(),
                percentile_value: *percentile,
                filters: filters.clone(),
            }),
        ),
    };

    let view = MetaView::new(metric.meta_sources());
    let eppo_metric = EppoMetric {
        name: metric.display_name().unwrap_or(name).to_string(),
        description: metric.description.clone().unwrap_or_default(),
        entity,
        metric_type: shape.metric_type(),
        numerator,
        denominator,
        percentile,
        is_guardrail: view.boolean(meta::IS_GUARDRAIL, diagnostics, name),
        metric_display_style: view.string(meta::DISPLAY_STYLE, diagnostics, name),
        minimum_detectable_effect: view.number(meta::MINIMUM_DETECTABLE_EFFECT, diagnostics, name),
        reference_url: view
            .string(meta::REFERENCE_URL, diagnostics, name)
            .or_else(|| options.reference_url_for(metric.source_file.as_deref())),
    };

    ensure_complete(name, &eppo_metric)?;
    Ok(eppo_metric)
}

/// Reject metrics that would be structurally incomplete for Eppo
fn ensure_complete(name: &str, metric: &EppoMetric) -> Result<()> {
    match metric.metric_type {
        MetricType::Percentile if metric.percentile.is_none() => Err(Error::mapping_for(
            name,
            format!("Percentile metric '{}' has no percentile specification", name),
        )),
        MetricType::Ratio if metric.denominator.is_none() => Err(Error::mapping_for(
            name,
            format!("Ratio metric '{}' has no denominator", name),
        )),
        MetricType::Simple | MetricType::Ratio if metric.numerator.is_none() => Err(Error::mapping_for(
            name,
            format!("Metric '{}' has no numerator", name),
        )),
        _ => Ok(()),
    }
}
