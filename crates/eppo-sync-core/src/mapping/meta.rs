//! Typed lookups in `meta` blocks
//!
//! Keys are tried in the order given (the `eppo_`-prefixed key first), and for
//! each key `meta` is consulted before `config.meta`.

use crate::diagnostics::{Diagnostics, Stage};
use crate::types::Meta;
use serde_json::Value;

pub(crate) const REFERENCE_URL: &[&str] = &["eppo_reference_url", "reference_url"];
pub(crate) const ALWAYS_FULL_REFRESH: &[&str] = &["eppo_always_full_refresh", "always_full_refresh"];
pub(crate) const DESIRED_CHANGE: &[&str] = &["eppo_desired_change", "desired_change"];
pub(crate) const IS_GUARDRAIL: &[&str] = &["eppo_is_guardrail", "is_guardrail"];
pub(crate) const DISPLAY_STYLE: &[&str] = &["eppo_display_style", "display_style", "metric_display_style"];
pub(crate) const MINIMUM_DETECTABLE_EFFECT: &[&str] = &["eppo_mde", "minimum_detectable_effect"];

pub(crate) struct MetaView<'a> {
    sources: [Option<&'a Meta>; 2],
}

impl<'a> MetaView<'a> {
    pub(crate) fn new(sources: [Option<&'a Meta>; 2]) -> Self {
        Self { sources }
    }

    /// First non-null value for any of `keys`
    pub(crate) fn lookup(&self, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
        keys.iter().find_map(|key| {
            self.sources
                .iter()
                .flatten()
                .find_map(|meta| meta.get(*key).filter(|v| !v.is_null()))
                .map(|value| (*key, value))
        })
    }

    fn typed<T>(
        &self,
        keys: &[&'static str],
        expected: &str,
        extract: impl Fn(&Value) -> Option<T>,
        diagnostics: &mut Diagnostics,
        subject: &str,
    ) -> Option<T> {
        let (key, value) = self.lookup(keys)?;
        let extracted = extract(value);
        if extracted.is_none() {
            diagnostics.warn(
                Stage::Map,
                Some(subject),
                format!("meta '{}' should be {}, found {}; ignored", key, expected, value),
            );
        }
        extracted
    }

    pub(crate) fn string(
        &self,
        keys: &[&'static str],
        diagnostics: &mut Diagnostics,
        subject: &str,
    ) -> Option<String> {
        self.typed(keys, "a string", |v| v.as_str().map(str::to_string), diagnostics, subject)
    }

    pub(crate) fn boolean(
        &self,
        keys: &[&'static str],
        diagnostics: &mut Diagnostics,
        subject: &str,
    ) -> Option<bool> {
        self.typed(keys, "a boolean", Value::as_bool, diagnostics, subject)
    }

    pub(crate) fn number(
        &self,
        keys: &[&'static str],
        diagnostics: &mut Diagnostics,
        subject: &str,
    ) -> Option<f64> {
        self.typed(keys, "a number", Value::as_f64, diagnostics, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Meta {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_prefixed_key_wins_over_bare_key() {
        let primary = meta(json!({"reference_url": "bare", "eppo_reference_url": "prefixed"}));
        let view = MetaView::new([Some(&primary), None]);
        let mut diagnostics = Diagnostics::new();
        assert_eq!(
            view.string(REFERENCE_URL, &mut diagnostics, "users").as_deref(),
            Some("prefixed")
        );
    }

    #[test]
    fn test_config_meta_fallback() {
        let primary = meta(json!({}));
        let config = meta(json!({"eppo_is_guardrail": true}));
        let view = MetaView::new([Some(&primary), Some(&config)]);
        let mut diagnostics = Diagnostics::new();
        assert_eq!(view.boolean(IS_GUARDRAIL, &mut diagnostics, "m"), Some(true));
    }

    #[test]
    fn test_wrong_type_is_ignored_with_warning() {
        let primary = meta(json!({"eppo_always_full_refresh": "yes", "eppo_mde": 0.05}));
        let view = MetaView::new([Some(&primary), None]);
        let mut diagnostics = Diagnostics::new();

        assert_eq!(view.boolean(ALWAYS_FULL_REFRESH, &mut diagnostics, "users"), None);
        assert_eq!(view.number(MINIMUM_DETECTABLE_EFFECT, &mut diagnostics, "users"), Some(0.05));
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(diagnostics.mentions("users", "should be a boolean"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let primary = meta(json!({"eppo_desired_change": null, "desired_change": "decrease"}));
        let view = MetaView::new([Some(&primary), None]);
        let mut diagnostics = Diagnostics::new();
        assert_eq!(
            view.string(DESIRED_CHANGE, &mut diagnostics, "revenue").as_deref(),
            Some("decrease")
        );
    }
}
