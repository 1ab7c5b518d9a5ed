//! Input types: dbt semantic definitions and the compiled manifest
//!
//! Definitions are read leniently. Optional lists may be written as `null`,
//! column expressions may be numbers (`expr: 1`), and the kind fields accept
//! any casing. Anything the mapper cannot use is reported there rather than
//! rejected here.
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Free-form `meta` block
pub type Meta = BTreeMap<String, Value>;

/// Treat an explicit `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept strings, numbers and booleans as column expressions
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a scalar expression, found {}",
            other
        ))),
    }
}

/// `config:` block of a dbt resource; only `meta` is relevant here
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemConfig {
    #[serde(default, deserialize_with = "nullable")]
    pub meta: Meta,
}

/// Kind of a semantic-model entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Primary,
    Foreign,
    Unique,
    Natural,
    Other(String),
}

impl From<String> for EntityKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "primary" => EntityKind::Primary,
            "foreign" => EntityKind::Foreign,
            "unique" => EntityKind::Unique,
            "natural" => EntityKind::Natural,
            _ => EntityKind::Other(value),
        }
    }
}

/// Kind of a semantic-model dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionKind {
    Categorical,
    Time,
    Other(String),
}

impl From<String> for DimensionKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "categorical" => DimensionKind::Categorical,
            "time" => DimensionKind::Time,
            _ => DimensionKind::Other(value),
        }
    }
}

/// Aggregation declared on a measure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationKind {
    Sum,
    Count,
    CountDistinct,
    /// `average`, `avg` or `mean`
    Average,
    Other(String),
}

impl From<String> for AggregationKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "sum" => AggregationKind::Sum,
            "count" => AggregationKind::Count,
            "count_distinct" => AggregationKind::CountDistinct,
            "average" | "avg" | "mean" => AggregationKind::Average,
            _ => AggregationKind::Other(value),
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationKind::Sum => write!(f, "sum"),
            AggregationKind::Count => write!(f, "count"),
            AggregationKind::CountDistinct => write!(f, "count_distinct"),
            AggregationKind::Average => write!(f, "average"),
            AggregationKind::Other(other) => write!(f, "{}", other),
        }
    }
}

/// Declared `type` of a metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricKind {
    Simple,
    Ratio,
    Derived,
    Sum,
    Count,
    CountDistinct,
    Median,
    /// `average` or `mean`
    Average,
    Percentile,
    Other(String),
}

impl From<String> for MetricKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "simple" => MetricKind::Simple,
            "ratio" => MetricKind::Ratio,
            "derived" => MetricKind::Derived,
            "sum" => MetricKind::Sum,
            "count" => MetricKind::Count,
            "count_distinct" => MetricKind::CountDistinct,
            "median" => MetricKind::Median,
            "average" | "mean" => MetricKind::Average,
            "percentile" => MetricKind::Percentile,
            _ => MetricKind::Other(value),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Simple => "simple",
            MetricKind::Ratio => "ratio",
            MetricKind::Derived => "derived",
            MetricKind::Sum => "sum",
            MetricKind::Count => "count",
            MetricKind::CountDistinct => "count_distinct",
            MetricKind::Median => "median",
            MetricKind::Average => "average",
            MetricKind::Percentile => "percentile",
            MetricKind::Other(other) => other.as_str(),
        };
        write!(f, "{}", name)
    }
}

/// Entity of a semantic model
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<EntityKindField>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub expr: Option<String>,
}

/// Dimension of a semantic model
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dimension {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<DimensionKindField>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub expr: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Measure of a semantic model
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Measure {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub agg: Option<AggregationField>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub expr: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub meta: Meta,
    #[serde(default)]
    pub config: Option<ItemConfig>,
}

macro_rules! string_enum_field {
    ($field:ident, $kind:ident) => {
        #[doc = concat!("Deserialization wrapper for [`", stringify!($kind), "`]")]
        #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
        #[serde(from = "String")]
        pub struct $field(pub $kind);

        impl From<String> for $field {
            fn from(value: String) -> Self {
                $field($kind::from(value))
            }
        }
    };
}

string_enum_field!(EntityKindField, EntityKind);
string_enum_field!(DimensionKindField, DimensionKind);
string_enum_field!(AggregationField, AggregationKind);
string_enum_field!(MetricKindField, MetricKind);

impl Entity {
    pub fn kind(&self) -> Option<&EntityKind> {
        self.kind.as_ref().map(|k| &k.0)
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.kind(), Some(EntityKind::Primary))
    }
}

impl Dimension {
    pub fn kind(&self) -> Option<&DimensionKind> {
        self.kind.as_ref().map(|k| &k.0)
    }

    pub fn is_time(&self) -> bool {
        matches!(self.kind(), Some(DimensionKind::Time))
    }
}

impl Measure {
    pub fn agg(&self) -> Option<&AggregationKind> {
        self.agg.as_ref().map(|a| &a.0)
    }

    /// `meta` with `config.meta` as fallback
    pub fn meta_sources(&self) -> [Option<&Meta>; 2] {
        [Some(&self.meta), self.config.as_ref().map(|c| &c.meta)]
    }
}

/// A dbt semantic model
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticModel {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Model reference, typically `ref('orders')`
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub entities: Vec<Entity>,
    #[serde(default, deserialize_with = "nullable")]
    pub dimensions: Vec<Dimension>,
    #[serde(default, deserialize_with = "nullable")]
    pub measures: Vec<Measure>,
    #[serde(default, deserialize_with = "nullable")]
    pub meta: Meta,
    #[serde(default)]
    pub config: Option<ItemConfig>,
    /// File the definition was read from
    #[serde(skip)]
    pub source_file: Option<PathBuf>,
    /// Manifest unique id, set by the linker
    #[serde(skip)]
    pub linked_node_id: Option<String>,
}

impl SemanticModel {
    pub fn meta_sources(&self) -> [Option<&Meta>; 2] {
        [Some(&self.meta), self.config.as_ref().map(|c| &c.meta)]
    }
}

/// Reference from a metric to a measure
///
/// Written either as a bare name or as `{name: ..., filter: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawMeasureRef")]
pub struct MeasureRef {
    pub name: String,
    pub filter: Option<FilterExpr>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMeasureRef {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        filter: Option<FilterExpr>,
    },
}

impl From<RawMeasureRef> for MeasureRef {
    fn from(raw: RawMeasureRef) -> Self {
        match raw {
            RawMeasureRef::Name(name) => MeasureRef { name, filter: None },
            RawMeasureRef::Detailed { name, filter } => MeasureRef { name, filter },
        }
    }
}

impl MeasureRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
        }
    }
}

/// Numerator or denominator of a metric
///
/// Written either as `{measure: <ref>, filter: ...}` or directly as a measure
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawMetricInput")]
pub struct MetricInput {
    pub measure: MeasureRef,
    pub filter: Option<FilterExpr>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMetricInput {
    Measure {
        measure: MeasureRef,
        #[serde(default)]
        filter: Option<FilterExpr>,
    },
    Reference(MeasureRef),
}

impl From<RawMetricInput> for MetricInput {
    fn from(raw: RawMetricInput) -> Self {
        match raw {
            RawMetricInput::Measure { measure, filter } => MetricInput { measure, filter },
            RawMetricInput::Reference(measure) => MetricInput {
                filter: measure.filter.clone(),
                measure,
            },
        }
    }
}

/// Filter expression: a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FilterExpr {
    One(String),
    Many(Vec<String>),
}

impl FilterExpr {
    pub fn expressions(&self) -> Vec<&str> {
        match self {
            FilterExpr::One(expr) => vec![expr.as_str()],
            FilterExpr::Many(exprs) => exprs.iter().map(String::as_str).collect(),
        }
    }
}

/// dbt's `type_params` block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeParams {
    #[serde(default)]
    pub measure: Option<MeasureRef>,
    #[serde(default)]
    pub numerator: Option<MetricInput>,
    #[serde(default)]
    pub denominator: Option<MetricInput>,
    #[serde(default)]
    pub percentile: Option<f64>,
}

/// A dbt metric
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metric {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<MetricKindField>,
    #[serde(default)]
    pub measure: Option<MeasureRef>,
    #[serde(default)]
    pub numerator: Option<MetricInput>,
    #[serde(default)]
    pub denominator: Option<MetricInput>,
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(default)]
    pub filter: Option<FilterExpr>,
    #[serde(default)]
    pub type_params: Option<TypeParams>,
    #[serde(default, deserialize_with = "nullable")]
    pub meta: Meta,
    #[serde(default)]
    pub config: Option<ItemConfig>,
    #[serde(skip)]
    pub source_file: Option<PathBuf>,
}

impl Metric {
    pub fn kind(&self) -> Option<&MetricKind> {
        self.kind.as_ref().map(|k| &k.0)
    }

    /// Top-level `measure`, falling back to `type_params.measure`
    pub fn measure_ref(&self) -> Option<&MeasureRef> {
        self.measure
            .as_ref()
            .or_else(|| self.type_params.as_ref().and_then(|p| p.measure.as_ref()))
    }

    pub fn numerator(&self) -> Option<&MetricInput> {
        self.numerator
            .as_ref()
            .or_else(|| self.type_params.as_ref().and_then(|p| p.numerator.as_ref()))
    }

    pub fn denominator(&self) -> Option<&MetricInput> {
        self.denominator
            .as_ref()
            .or_else(|| self.type_params.as_ref().and_then(|p| p.denominator.as_ref()))
    }

    pub fn percentile_value(&self) -> Option<f64> {
        self.percentile
            .or_else(|| self.type_params.as_ref().and_then(|p| p.percentile))
    }

    /// Display name: label first, then name
    pub fn display_name(&self) -> Option<&str> {
        self.label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .or(self.name.as_deref())
    }

    pub fn meta_sources(&self) -> [Option<&Meta>; 2] {
        [Some(&self.meta), self.config.as_ref().map(|c| &c.meta)]
    }
}

/// `metadata` block of the manifest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub project_name: Option<String>,
}

/// A manifest node; only the fields the linker needs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestNode {
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub compiled_code: Option<String>,
    #[serde(default)]
    pub compiled_sql: Option<String>,
}

impl ManifestNode {
    pub fn is_model(&self) -> bool {
        self.resource_type.as_deref() == Some("model")
    }

    /// Compiled SQL, preferring `compiled_code` over the older `compiled_sql`
    pub fn compiled_query(&self) -> Option<&str> {
        self.compiled_code
            .as_deref()
            .filter(|sql| !sql.trim().is_empty())
            .or_else(|| self.compiled_sql.as_deref().filter(|sql| !sql.trim().is_empty()))
    }
}

/// The compiled dbt manifest
///
/// Nodes are kept in a sorted map so that lookups iterate in unique-id order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "nullable")]
    pub metadata: ManifestMetadata,
    #[serde(default, deserialize_with = "nullable")]
    pub nodes: BTreeMap<String, ManifestNode>,
}

impl Manifest {
    pub fn project_name(&self) -> Option<&str> {
        self.metadata.project_name.as_deref()
    }
}
