//! Payload validation against the Eppo metrics-sync schema
//!
//! Copyright (c) 2025 Eppo Sync Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod payload;

pub use error::{SchemaError, SchemaResult, Violation};
pub use payload::{validate_payload, PayloadValidator};
