//! eppo-sync core - push dbt semantic-layer definitions to Eppo
//!
//! This crate turns a dbt project's semantic models and metrics into the
//! payload of Eppo's metrics-sync API and submits it.
//!
//! # Main Components
//!
//! - **Loader**: reads `manifest.json` and every definition YAML file
//! - **Linker**: ties each semantic model to its compiled manifest node
//! - **Mapper**: a pure function producing fact sources and metrics
//! - **Validation**: checks the payload against the bundled Eppo schema
//! - **HTTP client**: one blocking POST to the sync endpoint
//! - **Sync pipeline**: sequences the above and reports the outcome
//!
//! # Example
//!
//! ```no_run
//! use eppo_sync_core::{run_sync, SyncMode, SyncOptions};
//!
//! # fn example() -> eppo_sync_core::Result<()> {
//! let mut options = SyncOptions::new("./my_dbt_project", "eppo-api-key");
//! options.mode = SyncMode::DryRun;
//!
//! let report = run_sync(&options)?;
//! println!("{} fact sources, {} metrics", report.fact_sources, report.metrics);
//! # Ok(())
//! # }
//! ```
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

pub mod batch;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod linker;
pub mod loader;
pub mod mapping;
pub mod payload;
pub mod sync;
pub mod types;

// Re-export main types for convenience
pub use batch::{Batch, ItemFailure, ItemKind};
pub use diagnostics::{Diagnostic, Diagnostics, Severity, Stage};
pub use error::{Error, Result};
pub use http::{ClientConfig, ClientError, EppoClient, Submitter, TimeoutConfig, DEFAULT_BASE_URL};
pub use loader::{load_project, ProjectArtifacts};
pub use mapping::{default_sync_tag, map_sync_payload, MappingOptions, MappingOutcome};
pub use payload::{
    Aggregation, DesiredChange, EppoMetric, Fact, FactFilter, FactProperty, FactSource,
    FactSourceEntity, FilterOperation, MetricType, Operation, PercentileAggregation, SyncPayload,
};
pub use sync::{
    default_manifest_path, run_sync, run_sync_with, SyncMode, SyncOptions, SyncOutcome, SyncReport,
    SyncStage,
};
pub use types::{Manifest, Metric, SemanticModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
