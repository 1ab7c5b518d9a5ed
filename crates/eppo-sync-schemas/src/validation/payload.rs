//! Draft-07 validation of metrics-sync payloads
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

use crate::validation::error::{SchemaError, SchemaResult, Violation};
use serde_json::Value;

/// A compiled validator for metrics-sync payloads
pub struct PayloadValidator {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for PayloadValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadValidator").finish_non_exhaustive()
    }
}

impl PayloadValidator {
    /// Compile a schema document
    ///
    /// The schema is checked against the draft-07 meta-schema first; a
    /// malformed schema yields [`SchemaError::InvalidSchema`].
    pub fn new(schema: &Value) -> SchemaResult<Self> {
        let validator = jsonschema::draft7::new(schema).map_err(|e| SchemaError::InvalidSchema {
            message: e.to_string(),
        })?;
        Ok(Self { validator })
    }

    /// Collect every violation in `payload`, sorted by their rendered text
    pub fn violations(&self, payload: &Value) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .validator
            .iter_errors(payload)
            .map(|error| {
                Violation::new(
                    pointer_to_path(&error.instance_path.to_string()),
                    error.to_string(),
                    error.schema_path.to_string(),
                )
            })
            .collect();
        violations.sort_by_key(|v| v.to_string());
        violations
    }

    /// Check whether the payload satisfies the schema
    pub fn is_valid(&self, payload: &Value) -> bool {
        self.validator.is_valid(payload)
    }
}

/// Validate `payload` against `schema`, returning the violation messages
///
/// An empty list means the payload is valid.
pub fn validate_payload(payload: &Value, schema: &Value) -> SchemaResult<Vec<String>> {
    let validator = PayloadValidator::new(schema)?;
    Ok(validator
        .violations(payload)
        .iter()
        .map(ToString::to_string)
        .collect())
}

/// Convert a JSON pointer (`/fact_sources/0`) into a dotted path (`$.fact_sources.0`)
pub(crate) fn pointer_to_path(pointer: &str) -> String {
    let mut path = String::from("$");
    for segment in pointer.split('/').skip(1) {
        path.push('.');
        path.push_str(&segment.replace("~1", "/").replace("~0", "~"));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fact_source_schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "fact_sources": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["name", "timestamp_column"]
                    }
                }
            }
        })
    }

    #[test]
    fn test_pointer_to_path() {
        assert_eq!(pointer_to_path(""), "$");
        assert_eq!(pointer_to_path("/fact_sources/0"), "$.fact_sources.0");
        assert_eq!(pointer_to_path("/a~1b/c~0d"), "$.a/b.c~d");
    }

    #[test]
    fn test_valid_payload_has_no_violations() {
        let payload = json!({"fact_sources": [{"name": "users", "timestamp_column": "created_at"}]});
        let violations = validate_payload(&payload, &fact_source_schema()).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn test_missing_timestamp_column_reports_fact_source_path() {
        let payload = json!({"fact_sources": [{"name": "users"}]});
        let violations = validate_payload(&payload, &fact_source_schema()).unwrap();

        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("$.fact_sources.0"));
        assert!(violations[0].contains("timestamp_column"));
        assert!(violations[0].contains("required"));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let payload = json!({"fact_sources": [{}, {"name": "orders"}, "not-an-object"]});
        let violations = validate_payload(&payload, &fact_source_schema()).unwrap();

        // two missing properties on the first item, one on the second, one type error
        assert_eq!(violations.len(), 4);
        let mut sorted = violations.clone();
        sorted.sort();
        assert_eq!(violations, sorted);
    }

    #[test]
    fn test_invalid_schema_is_a_schema_error() {
        let schema = json!({"type": "object", "required": "timestamp_column"});
        let result = validate_payload(&json!({}), &schema);
        assert!(matches!(result, Err(SchemaError::InvalidSchema { .. })));
    }

    #[test]
    fn test_is_valid() {
        let validator = PayloadValidator::new(&fact_source_schema()).unwrap();
        assert!(validator.is_valid(&json!({"fact_sources": []})));
        assert!(!validator.is_valid(&json!({"fact_sources": [{}]})));
    }
}
