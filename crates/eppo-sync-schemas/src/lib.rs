//! eppo-sync schemas - the Eppo metrics-sync JSON Schema and its validator
//!
//! This crate bundles the draft-07 schema that a metrics-sync payload must
//! satisfy before it is sent to Eppo, and wraps the `jsonschema` validator so
//! that every violation is reported at once:
//!
//! - **Bundled schema**: compiled into the binary, overridable from a file
//! - **Exhaustive validation**: all violations, sorted, with payload paths
//! - **Schema errors**: a malformed schema is reported, never panics
//!
//! ## Quick Start
//!
//! ```rust
//! use eppo_sync_schemas::{bundled_schema, validate_payload};
//! use serde_json::json;
//!
//! let schema = bundled_schema().unwrap();
//! let payload = json!({"sync_tag": "manual", "fact_sources": [], "metrics": []});
//!
//! let violations = validate_payload(&payload, &schema).unwrap();
//! assert!(violations.is_empty());
//! ```
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

pub mod loader;
pub mod validation;

pub use loader::{bundled_schema, load_schema, resolve_schema_path, SCHEMA_PATH_ENV};
pub use validation::{
    validate_payload, PayloadValidator, SchemaError, SchemaResult, Violation,
};
