//! Integration tests for the bundled Eppo metrics-sync schema

use eppo_sync_schemas::{bundled_schema, validate_payload, PayloadValidator};
use serde_json::{json, Value};

fn valid_payload() -> Value {
    json!({
        "sync_tag": "dbt-sync-2025-01-01T00:00:00Z",
        "fact_sources": [{
            "name": "users",
            "sql": "select * from analytics.users",
            "timestamp_column": "created_at",
            "entities": [{"entity_name": "user", "column": "user_id"}],
            "facts": [
                {"name": "revenue", "column": "amount", "description": "", "desired_change": "increase"},
                {"name": "user_count", "description": ""}
            ],
            "properties": [{"name": "country", "column": "country_code", "description": ""}]
        }],
        "metrics": [
            {
                "name": "Total Revenue",
                "description": "",
                "entity": "user",
                "type": "simple",
                "numerator": {"fact_name": "revenue", "operation": "sum"}
            },
            {
                "name": "Average Revenue",
                "description": "",
                "entity": "user",
                "type": "ratio",
                "numerator": {"fact_name": "revenue", "operation": "sum"},
                "denominator": {"fact_name": "revenue", "operation": "count"}
            },
            {
                "name": "p95 revenue",
                "description": "",
                "entity": "user",
                "type": "percentile",
                "percentile": {
                    "fact_name": "revenue",
                    "percentile_value": 0.95,
                    "filters": [{"fact_property": "country", "operation": "equals", "values": ["CA"]}]
                }
            }
        ]
    })
}

#[test]
fn test_valid_payload_passes() {
    let schema = bundled_schema().unwrap();
    let violations = validate_payload(&valid_payload(), &schema).unwrap();
    assert!(violations.is_empty(), "unexpected violations: {:?}", violations);
}

#[test]
fn test_missing_timestamp_column() {
    let schema = bundled_schema().unwrap();
    let mut payload = valid_payload();
    payload["fact_sources"][0]
        .as_object_mut()
        .unwrap()
        .remove("timestamp_column");

    let violations = validate_payload(&payload, &schema).unwrap();
    assert_eq!(violations.len(), 1);
    assert!(violations[0].contains("'$.fact_sources.0'"));
    assert!(violations[0].contains("timestamp_column"));
}

#[test]
fn test_ratio_without_denominator() {
    let schema = bundled_schema().unwrap();
    let mut payload = valid_payload();
    payload["metrics"][1]
        .as_object_mut()
        .unwrap()
        .remove("denominator");

    let violations = validate_payload(&payload, &schema).unwrap();
    assert!(!violations.is_empty());
    assert!(violations.iter().any(|v| v.contains("$.metrics.1") && v.contains("denominator")));
}

#[test]
fn test_unknown_operation_and_empty_entities() {
    let schema = bundled_schema().unwrap();
    let mut payload = valid_payload();
    payload["metrics"][0]["numerator"]["operation"] = json!("average");
    payload["fact_sources"][0]["entities"] = json!([]);

    let validator = PayloadValidator::new(&schema).unwrap();
    let violations = validator.violations(&payload);

    assert!(violations.iter().any(|v| v.path == "$.metrics.0.numerator.operation"));
    assert!(violations.iter().any(|v| v.path == "$.fact_sources.0.entities"));
}
