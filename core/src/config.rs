//! Client configuration and builder.

use std::time::Duration;

use crate::error::ApiError;

/// Configuration for `Sas9ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// URL of the server running the SAS9API proxy (e.g. `http://sas.local:8080`).
    pub base_url: String,
    /// Timeout for a whole request, connect through body read (default: 30 seconds).
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Largest response body accepted, in bytes (default: 64 MiB).
    pub max_response_bytes: u64,
}

impl ClientConfig {
    /// Minimum allowed timeout value.
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            user_agent: format!("sas9api-rs/{}", env!("CARGO_PKG_VERSION")),
            max_response_bytes: Self::DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }

    /// Validate the configuration.
    ///
    /// The base URL is only checked for emptiness; its shape is left to the
    /// transport.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::Config("base_url cannot be empty".to_string()));
        }
        if self.timeout < Self::MIN_TIMEOUT {
            return Err(ApiError::Config(format!(
                "timeout ({:?}) must be >= {:?}",
                self.timeout,
                Self::MIN_TIMEOUT
            )));
        }
        if self.max_response_bytes == 0 {
            return Err(ApiError::Config(
                "max_response_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(base_url),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn max_response_bytes(mut self, max: u64) -> Self {
        self.config.max_response_bytes = max;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ClientConfig, ApiError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("http://sas.local:8080");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_response_bytes, 64 * 1024 * 1024);
        assert!(config.user_agent.starts_with("sas9api-rs/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder("http://sas.local:8080")
            .timeout(Duration::from_secs(5))
            .user_agent("reporting-job/1.0")
            .max_response_bytes(1024)
            .build()
            .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "reporting-job/1.0");
        assert_eq!(config.max_response_bytes, 1024);
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let err = ClientConfig::builder("  ").build().unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains("base_url")));
    }

    #[test]
    fn tiny_timeout_is_rejected() {
        let err = ClientConfig::builder("http://sas.local")
            .timeout(Duration::from_millis(10))
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains("timeout")));
    }

    #[test]
    fn zero_response_cap_is_rejected() {
        let err = ClientConfig::builder("http://sas.local")
            .max_response_bytes(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
