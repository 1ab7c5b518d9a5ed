//! Failure shapes of a sync submission
//!
//! Any response body that was received is kept; `Display` only shows a truncated
//! prefix of it.

use thiserror::Error;

/// Number of body characters shown when an error is displayed
pub const DISPLAY_BODY_LIMIT: usize = 500;

/// Error returned by the Eppo API client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// No response was received (DNS, refused connection, TLS, timeout)
    #[error("Could not reach Eppo at {url}: {message}")]
    Connectivity {
        url: String,
        message: String,
        timed_out: bool,
    },

    /// The API answered with a non-2xx status
    #[error("Eppo API returned HTTP {status} for {url}: {}", truncate(.body, DISPLAY_BODY_LIMIT))]
    Status { url: String, status: u16, body: String },

    /// A response arrived but its body could not be read
    #[error("Could not read the Eppo API response body from {url} (HTTP {status}): {message}")]
    ResponseBody { url: String, status: u16, message: String },

    /// A 2xx response whose body is not JSON
    #[error("Could not decode the Eppo API response from {url}: {message}")]
    Decode {
        url: String,
        message: String,
        body: String,
    },
}

impl ClientError {
    /// HTTP status code, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } | ClientError::ResponseBody { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Connectivity { timed_out: true, .. })
    }

    /// Up to `limit` characters of the response body, if there was one
    pub fn response_snippet(&self, limit: usize) -> Option<String> {
        match self {
            ClientError::Status { body, .. } | ClientError::Decode { body, .. } if !body.is_empty() => {
                Some(truncate(body, limit))
            }
            _ => None,
        }
    }
}

/// First `limit` characters of `text`, marked when cut
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_truncates_body() {
        let err = ClientError::Status {
            url: "https://eppo.cloud/api/v1/metrics/sync".to_string(),
            status: 422,
            body: "x".repeat(2000),
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("Eppo API returned HTTP 422"));
        assert!(rendered.ends_with(&format!("{}...", "x".repeat(10))));
        assert!(rendered.len() < 700);
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.response_snippet(1000).unwrap().len(), 1003);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_connectivity_has_no_snippet() {
        let err = ClientError::Connectivity {
            url: "http://localhost:1".to_string(),
            message: "connection refused".to_string(),
            timed_out: false,
        };
        assert_eq!(err.response_snippet(100), None);
        assert!(!err.is_timeout());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_unreadable_body_keeps_status() {
        let err = ClientError::ResponseBody {
            url: "https://eppo.cloud/api/v1/metrics/sync".to_string(),
            status: 200,
            message: "connection closed before message completed".to_string(),
        };
        assert!(err.to_string().starts_with("Could not read the Eppo API response body"));
        assert_eq!(err.status(), Some(200));
        assert!(!err.is_timeout());
        assert_eq!(err.response_snippet(100), None);
    }
}
