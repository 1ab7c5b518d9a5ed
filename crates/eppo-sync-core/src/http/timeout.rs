//! Timeout configuration for the Eppo API client
//!
//! One attempt is made per sync; a request that exceeds these limits fails
//! as a connectivity error.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout configuration for HTTP requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout - time to establish a connection
    pub connect_timeout: Duration,
    /// Request timeout - total time for the entire request
    pub request_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl TimeoutConfig {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    /// Override the request timeout, keeping the connect timeout
    pub fn with_request_timeout(&self, timeout: Duration) -> Self {
        let mut config = self.clone();
        config.request_timeout = timeout;
        config
    }

    /// Build from whole seconds, falling back to defaults for missing values
    pub fn from_secs(connect_secs: Option<u64>, request_secs: Option<u64>) -> Self {
        let defaults = Self::default();
        Self {
            connect_timeout: connect_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            request_timeout: request_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout.is_zero() {
            return Err("Connect timeout cannot be zero".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        if self.request_timeout < self.connect_timeout {
            return Err("Request timeout should be >= connect timeout".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_default() {
        let config = TimeoutConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_config_validation() {
        let mut config = TimeoutConfig::default();
        assert!(config.validate().is_ok());

        config.connect_timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());

        config.connect_timeout = Duration::from_secs(10);
        config.request_timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());

        config.request_timeout = Duration::from_secs(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_secs_and_override() {
        let config = TimeoutConfig::from_secs(None, Some(120));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(120));

        let shorter = config.with_request_timeout(Duration::from_secs(15));
        assert_eq!(shorter.request_timeout, Duration::from_secs(15));
        assert_eq!(shorter.connect_timeout, config.connect_timeout);
    }
}
