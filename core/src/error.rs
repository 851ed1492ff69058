//! Error types for the SAS9API client.
//!
//! # Design
//! The proxy can fail a call in three distinguishable ways: no response at
//! all (`Transport`), a non-2xx response (`Http`), or a 2xx response whose
//! body is not a usable envelope (`MalformedResponse`). Each carries the
//! relative endpoint so a failure can be traced back to the call that
//! produced it.

use std::error::Error as StdError;

/// Errors returned by `Sas9ApiClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received (connection, DNS, TLS, timeout, or the body
    /// could not be read).
    #[error("transport failure calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The proxy answered with a status outside 200..=299.
    #[error("HTTP {status} from {endpoint}: {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
        body: String,
    },

    /// The proxy answered 2xx but the body is not a usable envelope.
    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// A request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The client configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of an `Http` failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The message reported for an `Http` failure: the server's `error`
    /// field when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Relative endpoint of the call that failed.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ApiError::Transport { endpoint, .. }
            | ApiError::Http { endpoint, .. }
            | ApiError::MalformedResponse { endpoint, .. } => Some(endpoint),
            ApiError::Serialization(_) | ApiError::Config(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    pub(crate) fn transport(
        endpoint: &str,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        ApiError::Transport {
            endpoint: endpoint.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn malformed(endpoint: &str, reason: impl Into<String>) -> Self {
        ApiError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
