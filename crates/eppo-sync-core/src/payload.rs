//! Eppo metrics-sync payload types
//!
//! These serialize to exactly the JSON the `/api/v1/metrics/sync` endpoint
//! expects. Optional fields are omitted rather than sent as `null`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete sync payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub sync_tag: String,
    pub fact_sources: Vec<FactSource>,
    pub metrics: Vec<EppoMetric>,
}

/// An Eppo fact source, produced from one semantic model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactSource {
    pub name: String,
    pub sql: String,
    pub timestamp_column: String,
    pub entities: Vec<FactSourceEntity>,
    pub facts: Vec<Fact>,
    pub properties: Vec<FactProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_full_refresh: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSourceEntity {
    pub entity_name: String,
    pub column: String,
}

/// A fact, produced from one measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_change: Option<DesiredChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredChange {
    Increase,
    Decrease,
}

impl DesiredChange {
    /// Parse the exact literals `increase` / `decrease`
    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "increase" => Some(DesiredChange::Increase),
            "decrease" => Some(DesiredChange::Decrease),
            _ => None,
        }
    }
}

/// A fact property, produced from one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactProperty {
    pub name: String,
    pub column: String,
    pub description: String,
}

/// Eppo metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Simple,
    Ratio,
    Percentile,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricType::Simple => write!(f, "simple"),
            MetricType::Ratio => write!(f, "ratio"),
            MetricType::Percentile => write!(f, "percentile"),
        }
    }
}

/// An Eppo metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EppoMetric {
    pub name: String,
    pub description: String,
    pub entity: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerator: Option<Aggregation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denominator: Option<Aggregation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<PercentileAggregation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_guardrail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_display_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_detectable_effect: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

/// Aggregation operation applied to a fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Sum,
    Count,
    DistinctEntity,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Sum => write!(f, "sum"),
            Operation::Count => write!(f, "count"),
            Operation::DistinctEntity => write!(f, "distinct_entity"),
        }
    }
}

/// Numerator or denominator of a metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub fact_name: String,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FactFilter>,
}

/// Percentile specification of a percentile metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileAggregation {
    pub fact_name: String,
    pub percentile_value: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FactFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperation {
    Equals,
    NotEquals,
}

/// A property filter on a numerator, denominator or percentile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactFilter {
    pub fact_property: String,
    pub operation: FilterOperation,
    pub values: Vec<String>,
}
