//! The sync pipeline
//!
//! A run moves strictly forward through
//! `Init -> Load -> Map -> Validate -> (DryPrint | Submit) -> Done`
//! (linking happens inside Load). Run-level failures abort at the stage
//! where they occur; per-item failures inside the mapper are carried in the
//! report instead.
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

use crate::batch::ItemFailure;
use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{Error, Result};
use crate::http::{ClientConfig, EppoClient, Submitter};
use crate::loader::load_project;
use crate::mapping::{map_sync_payload, MappingOptions};
use crate::payload::SyncPayload;
use eppo_sync_schemas::{load_schema, validate_payload};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// Characters of an error response surfaced when submission fails
pub const SUBMIT_SNIPPET_LIMIT: usize = 1000;

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Init,
    Load,
    Map,
    Validate,
    DryPrint,
    Submit,
    Done,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStage::Init => "init",
            SyncStage::Load => "load",
            SyncStage::Map => "map",
            SyncStage::Validate => "validate",
            SyncStage::DryPrint => "dry_print",
            SyncStage::Submit => "submit",
            SyncStage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Whether the payload is sent or only rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    Live,
    DryRun,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Live => write!(f, "live"),
            SyncMode::DryRun => write!(f, "dry run"),
        }
    }
}

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub project_dir: PathBuf,
    /// Defaults to `<project_dir>/target/manifest.json`
    pub manifest_path: Option<PathBuf>,
    pub api_key: String,
    pub client: ClientConfig,
    pub mode: SyncMode,
    pub sync_tag: Option<String>,
    pub reference_url_base: Option<String>,
    /// Schema override; the bundled schema is used otherwise
    pub schema_path: Option<PathBuf>,
}

impl SyncOptions {
    pub fn new(project_dir: impl Into<PathBuf>, api_key: impl Into<String>) -> Self {
        Self {
            project_dir: project_dir.into(),
            manifest_path: None,
            api_key: api_key.into(),
            client: ClientConfig::default(),
            mode: SyncMode::default(),
            sync_tag: None,
            reference_url_base: None,
            schema_path: None,
        }
    }

    pub fn resolved_manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| default_manifest_path(&self.project_dir))
    }

    fn mapping_options(&self) -> MappingOptions {
        MappingOptions {
            sync_tag: self.sync_tag.clone(),
            reference_url_base: self.reference_url_base.clone(),
            project_dir: Some(self.project_dir.clone()),
        }
    }
}

/// `<project_dir>/target/manifest.json`
pub fn default_manifest_path(project_dir: &Path) -> PathBuf {
    project_dir.join("target").join("manifest.json")
}

/// How a successful run ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No semantic models were found
    NothingToSync,
    /// Dry run: the validated payload, pretty-printed
    Rendered { payload_json: String },
    /// Live run: the decoded API response
    Submitted { response: Value },
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub stage: SyncStage,
    pub sync_tag: Option<String>,
    pub metrics_found: usize,
    pub semantic_models_found: usize,
    pub fact_sources: usize,
    pub metrics: usize,
    pub skipped: Vec<ItemFailure>,
    pub diagnostics: Diagnostics,
    pub outcome: SyncOutcome,
    #[serde(skip)]
    pub payload: Option<SyncPayload>,
}

/// Forward-only stage tracker
struct Progress {
    stage: SyncStage,
}

impl Progress {
    fn new() -> Self {
        Self {
            stage: SyncStage::Init,
        }
    }

    fn advance(&mut self, next: SyncStage) -> Result<()> {
        if next <= self.stage {
            return Err(Error::Internal {
                message: format!("Sync cannot move from {} back to {}", self.stage, next),
                source: anyhow::anyhow!("invalid stage transition"),
            });
        }
        debug!(from = %self.stage, to = %next, "Sync stage");
        self.stage = next;
        Ok(())
    }
}

/// Run a sync against the Eppo API
///
/// The client is built first, so a missing API key or a bad base URL fails
/// the run before any file is read, in dry runs too.
pub fn run_sync(options: &SyncOptions) -> Result<SyncReport> {
    let client = EppoClient::new(&options.api_key, options.client.clone())?;
    run_sync_with(options, &client)
}

/// Run a sync with any [`Submitter`]
#[instrument(skip_all, fields(project_dir = %options.project_dir.display(), mode = %options.mode))]
pub fn run_sync_with(options: &SyncOptions, submitter: &dyn Submitter) -> Result<SyncReport> {
    let mut progress = Progress::new();
    info!(endpoint = submitter.endpoint(), "Starting sync");

    progress.advance(SyncStage::Load)?;
    let manifest_path = options.resolved_manifest_path();
    let artifacts = load_project(&options.project_dir, &manifest_path)?;
    let mut diagnostics = artifacts.diagnostics.clone();

    let mut report = SyncReport {
        mode: options.mode,
        stage: progress.stage,
        sync_tag: None,
        metrics_found: artifacts.metrics.len(),
        semantic_models_found: artifacts.semantic_models.len(),
        fact_sources: 0,
        metrics: 0,
        skipped: Vec::new(),
        diagnostics: Diagnostics::new(),
        outcome: SyncOutcome::NothingToSync,
        payload: None,
    };

    if artifacts.semantic_models.is_empty() {
        diagnostics.info(
            Stage::Load,
            None,
            "No semantic models found; nothing to sync",
        );
        progress.advance(SyncStage::Done)?;
        report.stage = progress.stage;
        report.diagnostics = diagnostics;
        return Ok(report);
    }

    progress.advance(SyncStage::Map)?;
    let outcome = map_sync_payload(
        &artifacts.metrics,
        &artifacts.semantic_models,
        &artifacts.compiled_sql,
        &options.mapping_options(),
    )?;
    diagnostics.extend(outcome.diagnostics);
    let payload = outcome.payload;
    report.sync_tag = Some(payload.sync_tag.clone());
    report.fact_sources = payload.fact_sources.len();
    report.metrics = payload.metrics.len();
    report.skipped = outcome.failures;

    progress.advance(SyncStage::Validate)?;
    validate(&payload, options.schema_path.as_deref(), &mut diagnostics)?;

    report.outcome = match options.mode {
        SyncMode::DryRun => {
            progress.advance(SyncStage::DryPrint)?;
            let payload_json = serde_json::to_string_pretty(&payload)?;
            info!(bytes = payload_json.len(), "Dry run: payload rendered, nothing sent");
            SyncOutcome::Rendered { payload_json }
        }
        SyncMode::Live => {
            progress.advance(SyncStage::Submit)?;
            let response = submitter.submit(&payload).map_err(|err| {
                match err.response_snippet(SUBMIT_SNIPPET_LIMIT) {
                    Some(snippet) => error!(
                        status = ?err.status(),
                        response = %snippet,
                        "Failed to send payload to Eppo"
                    ),
                    None => error!(error = %err, "Failed to send payload to Eppo"),
                }
                Error::from(err)
            })?;
            info!(sync_tag = %payload.sync_tag, "Payload accepted by Eppo");
            SyncOutcome::Submitted { response }
        }
    };

    progress.advance(SyncStage::Done)?;
    report.stage = progress.stage;
    report.diagnostics = diagnostics;
    report.payload = Some(payload);

    info!(
        sync_tag = report.sync_tag.as_deref().unwrap_or_default(),
        fact_sources = report.fact_sources,
        metrics = report.metrics,
        skipped = report.skipped.len(),
        "Sync complete"
    );
    Ok(report)
}

/// Validate the payload; every violation is logged before failing
fn validate(payload: &SyncPayload, schema_path: Option<&Path>, diagnostics: &mut Diagnostics) -> Result<()> {
    let schema = load_schema(schema_path)?;
    let document = serde_json::to_value(payload)?;
    let violations = validate_payload(&document, &schema)?;

    if violations.is_empty() {
        debug!("Payload matches the Eppo schema");
        return Ok(());
    }

    for violation in &violations {
        diagnostics.error(Stage::Validate, None, violation.clone());
    }
    Err(Error::Validation { violations })
}
