//! HTTP client for the Eppo API
//!
//! This module provides:
//! - The blocking [`EppoClient`] for the metrics-sync endpoint
//! - The [`Submitter`] seam the sync pipeline depends on
//! - Response classification into [`ClientError`] shapes
//! - Timeout configuration

pub mod client;
pub mod error;
pub mod timeout;

pub use client::{
    interpret_response, normalize_base_url, ClientConfig, EppoClient, Submitter, DEFAULT_BASE_URL,
    METRICS_SYNC_ENDPOINT, TOKEN_HEADER,
};
pub use error::{ClientError, DISPLAY_BODY_LIMIT};
pub use timeout::TimeoutConfig;

// Re-export commonly used types
pub use reqwest::StatusCode;
