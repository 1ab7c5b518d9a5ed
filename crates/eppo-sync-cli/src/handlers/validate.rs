//! Validate command handler

use super::utils::read_document;
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use eppo_sync_schemas::{load_schema, validate_payload};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
#[instrument(skip(config, output), fields(file = %args.payload.display()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &format!("file: {}", args.payload.display()));
    output.info(&format!("Validating payload: {}", args.payload.display()))?;

    let document = read_document(&args.payload)?;
    debug!("Payload parsed");

    let schema_path = args.schema.as_deref().or(config.sync.schema_path.as_deref());
    let schema = load_schema(schema_path)?;
    let violations = {
        let _validation_timer = Timer::new("schema_validation");
        validate_payload(&document, &schema)?
    };

    output.violations(&violations)?;

    if violations.is_empty() {
        info!("Payload is valid");
        output.success(&format!(
            "✓ Payload is valid ({} fact source(s), {} metric(s))",
            count(&document, "fact_sources"),
            count(&document, "metrics")
        ))?;
        return Ok(());
    }

    warn!(violations = violations.len(), "Payload failed validation");
    Err(Error::InvalidPayload {
        path: args.payload,
        violations,
    })
}

fn count(document: &Value, key: &str) -> usize {
    document
        .get(key)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn quiet_output() -> OutputWriter {
        OutputWriter::new(OutputFormat::Human, false, true)
    }

    fn args(payload: PathBuf) -> ValidateArgs {
        ValidateArgs {
            payload,
            schema: None,
        }
    }

    #[test]
    fn test_valid_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(
            &path,
            json!({"sync_tag": "manual", "fact_sources": [], "metrics": []}).to_string(),
        )
        .unwrap();

        handle_validate(args(path), &Config::default(), &mut quiet_output()).unwrap();
    }

    #[test]
    fn test_missing_timestamp_column_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payload.yaml");
        std::fs::write(
            &path,
            r#"
sync_tag: manual
fact_sources:
  - name: users
    sql: select * from analytics.dim_users
    entities:
      - entity_name: user
        column: user_id
    facts: []
metrics: []
"#,
        )
        .unwrap();

        let err = handle_validate(args(path), &Config::default(), &mut quiet_output()).unwrap_err();
        assert!(err
            .violations()
            .iter()
            .any(|v| v.contains("$.fact_sources.0") && v.contains("timestamp_column")));
    }

    #[test]
    fn test_schema_from_config() {
        let dir = tempdir().unwrap();
        let schema_path = dir.path().join("schema.json");
        std::fs::write(&schema_path, r#"{"type": "object", "required": ["owner"]}"#).unwrap();
        let payload_path = dir.path().join("payload.json");
        std::fs::write(&payload_path, r#"{"sync_tag": "manual"}"#).unwrap();

        let mut config = Config::default();
        config.sync.schema_path = Some(schema_path);

        let err = handle_validate(args(payload_path), &config, &mut quiet_output()).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert!(err.violations()[0].contains("owner"));
    }

    #[test]
    fn test_count_entries() {
        let document = json!({"metrics": [{}, {}], "fact_sources": "oops"});
        assert_eq!(count(&document, "metrics"), 2);
        assert_eq!(count(&document, "fact_sources"), 0);
        assert_eq!(count(&document, "missing"), 0);
    }
}
