//! Translation of dbt metric filters into Eppo fact filters
//!
//! Only one form is understood: a templated dimension compared with a quoted
//! literal, e.g. `{{ Dimension('users__user__country') }} = 'CA'`. The last
//! `__` segment of the dimension path must name a property of the fact
//! source. Anything else is dropped with a warning and the metric proceeds
//! unfiltered.

use crate::diagnostics::{Diagnostics, Stage};
use crate::payload::{FactFilter, FactProperty, FilterOperation};
use crate::types::FilterExpr;
use regex::Regex;
use std::sync::OnceLock;

static FILTER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn filter_pattern() -> &'static Regex {
    FILTER_PATTERN.get_or_init(|| {
        Regex::new(
            r#"^\s*\{\{\s*Dimension\s*\(\s*['"]([\w_]+)['"]\s*\)\s*\}\}\s*(!=|==|=)\s*['"]([^'"]+)['"]\s*$"#,
        )
        .expect("filter pattern is a valid regex")
    })
}

/// Parsed form of a filter expression before property matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilter {
    pub dimension_path: String,
    pub operation: FilterOperation,
    pub value: String,
}

impl ParsedFilter {
    /// Candidate property name: the last `__` segment of the dimension path
    pub fn property_name(&self) -> &str {
        self.dimension_path
            .rsplit("__")
            .next()
            .unwrap_or(&self.dimension_path)
    }
}

/// Parse a single filter expression
pub fn parse_filter(expression: &str) -> Option<ParsedFilter> {
    let captures = filter_pattern().captures(expression)?;
    let operation = match captures.get(2)?.as_str() {
        "=" | "==" => FilterOperation::Equals,
        "!=" => FilterOperation::NotEquals,
        _ => return None,
    };
    Some(ParsedFilter {
        dimension_path: captures.get(1)?.as_str().to_string(),
        operation,
        value: captures.get(3)?.as_str().to_string(),
    })
}

/// Translate one filter expression against the available properties
///
/// Returns an empty list, with a warning, when the expression cannot be used.
pub fn translate_filter(
    expression: &str,
    properties: &[FactProperty],
    diagnostics: &mut Diagnostics,
    subject: &str,
) -> Vec<FactFilter> {
    let Some(parsed) = parse_filter(expression) else {
        diagnostics.warn(
            Stage::Map,
            Some(subject),
            format!("Unsupported filter expression '{}'; metric left unfiltered", expression.trim()),
        );
        return Vec::new();
    };

    let property = parsed.property_name();
    if !properties.iter().any(|p| p.name == property) {
        diagnostics.warn(
            Stage::Map,
            Some(subject),
            format!(
                "Filter dimension '{}' does not match any fact property; metric left unfiltered",
                parsed.dimension_path
            ),
        );
        return Vec::new();
    }

    vec![FactFilter {
        fact_property: property.to_string(),
        operation: parsed.operation,
        values: vec![parsed.value],
    }]
}

/// Translate every expression of a metric filter
pub fn translate_filters(
    filter: Option<&FilterExpr>,
    properties: &[FactProperty],
    diagnostics: &mut Diagnostics,
    subject: &str,
) -> Vec<FactFilter> {
    filter
        .map(|expr| {
            expr.expressions()
                .into_iter()
                .flat_map(|e| translate_filter(e, properties, diagnostics, subject))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties() -> Vec<FactProperty> {
        vec![FactProperty {
            name: "country".to_string(),
            column: "country_code".to_string(),
            description: String::new(),
        }]
    }

    #[test]
    fn test_equals_filter() {
        let mut diagnostics = Diagnostics::new();
        let filters = translate_filter(
            "{{ Dimension('users__user__country') }} = 'CA'",
            &properties(),
            &mut diagnostics,
            "revenue",
        );
        assert_eq!(
            filters,
            vec![FactFilter {
                fact_property: "country".to_string(),
                operation: FilterOperation::Equals,
                values: vec!["CA".to_string()],
            }]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            parse_filter("{{Dimension(\"country\")}} == \"US\"").unwrap().operation,
            FilterOperation::Equals
        );
        let parsed = parse_filter("{{ Dimension('user__country') }} != 'US'").unwrap();
        assert_eq!(parsed.operation, FilterOperation::NotEquals);
        assert_eq!(parsed.property_name(), "country");
    }

    #[test]
    fn test_unparsable_filter_yields_empty_list() {
        let mut diagnostics = Diagnostics::new();
        for expression in [
            "{{ Dimension('user__country') }} > 'CA'",
            "{{ Dimension('user__country') }} = 'CA' AND {{ Dimension('user__plan') }} = 'pro'",
            "country = 'CA'",
            "",
        ] {
            assert!(translate_filter(expression, &properties(), &mut diagnostics, "m").is_empty());
        }
        assert_eq!(diagnostics.warning_count(), 4);
    }

    #[test]
    fn test_unknown_property_is_dropped() {
        let mut diagnostics = Diagnostics::new();
        let filters = translate_filter(
            "{{ Dimension('user__Country') }} = 'CA'",
            &properties(),
            &mut diagnostics,
            "m",
        );
        assert!(filters.is_empty());
        assert!(diagnostics.mentions("m", "does not match any fact property"));
    }

    #[test]
    fn test_filter_list() {
        let mut diagnostics = Diagnostics::new();
        let expr = FilterExpr::Many(vec![
            "{{ Dimension('user__country') }} = 'CA'".to_string(),
            "not a filter".to_string(),
        ]);
        let filters = translate_filters(Some(&expr), &properties(), &mut diagnostics, "m");
        assert_eq!(filters.len(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(translate_filters(None, &properties(), &mut diagnostics, "m").is_empty());
    }
}
