//! Blocking client for the Eppo metrics-sync endpoint

use crate::error::{Error, Result};
use crate::http::{ClientError, TimeoutConfig};
use crate::payload::SyncPayload;
use reqwest::blocking::Client as ReqwestClient;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

/// Default Eppo API base URL
pub const DEFAULT_BASE_URL: &str = "https://eppo.cloud";

/// Path of the metrics-sync endpoint under the base URL
pub const METRICS_SYNC_ENDPOINT: &str = "/api/v1/metrics/sync";

/// Header carrying the API key
pub const TOKEN_HEADER: &str = "X-Eppo-Token";

/// Anything that can deliver a payload to Eppo
pub trait Submitter {
    /// Full URL the payload is sent to
    fn endpoint(&self) -> &str;

    /// Send the payload and return the decoded response body
    fn submit(&self, payload: &SyncPayload) -> std::result::Result<Value, ClientError>;
}

/// Configuration for the Eppo client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: TimeoutConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Normalize and check a base URL; the trailing slash is dropped
pub fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|e| Error::Configuration {
        message: format!("Invalid Eppo base URL '{}': {}", base_url, e),
        source: Some(e.into()),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::configuration(format!(
            "Invalid Eppo base URL '{}': scheme must be http or https",
            base_url
        )));
    }

    Ok(trimmed.to_string())
}

/// Eppo API client
#[derive(Debug)]
pub struct EppoClient {
    client: ReqwestClient,
    base_url: String,
    endpoint: String,
}

impl EppoClient {
    /// Create a client; the API key must be non-empty
    pub fn new(api_key: &str, config: ClientConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::configuration("Eppo API key is required"));
        }
        config.timeouts.validate().map_err(Error::configuration)?;
        let base_url = normalize_base_url(&config.base_url)?;

        let mut token = HeaderValue::from_str(api_key.trim()).map_err(|e| Error::Configuration {
            message: "Eppo API key contains characters not allowed in an HTTP header".to_string(),
            source: Some(e.into()),
        })?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = ReqwestClient::builder()
            .default_headers(headers)
            .connect_timeout(config.timeouts.connect_timeout)
            .timeout(config.timeouts.request_timeout)
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e.into()),
            })?;

        let endpoint = format!("{}{}", base_url, METRICS_SYNC_ENDPOINT);
        debug!(endpoint = %endpoint, "Eppo client ready");

        Ok(Self {
            client,
            base_url,
            endpoint,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Submitter for EppoClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn submit(&self, payload: &SyncPayload) -> std::result::Result<Value, ClientError> {
        info!(
            endpoint = %self.endpoint,
            fact_sources = payload.fact_sources.len(),
            metrics = payload.metrics.len(),
            "Submitting payload to Eppo"
        );

        let connectivity = |e: reqwest::Error| ClientError::Connectivity {
            url: self.endpoint.clone(),
            message: e.to_string(),
            timed_out: e.is_timeout(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .map_err(connectivity)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| ClientError::ResponseBody {
            url: self.endpoint.clone(),
            status,
            message: e.to_string(),
        })?;

        debug!(status, bytes = body.len(), "Eppo API responded");
        interpret_response(&self.endpoint, status, &body)
    }
}

/// Classify a received response
///
/// 2xx with a JSON body yields that body; 204 or an empty body yields `{}`.
pub fn interpret_response(url: &str, status: u16, body: &str) -> std::result::Result<Value, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Status {
            url: url.to_string(),
            status,
            body: body.to_string(),
        });
    }

    if status == 204 || body.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_str(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
        body: body.to_string(),
    })
}
