//! Error types for the downstream adapter.

use std::time::Duration;

/// Why a single downstream call failed.
///
/// Every variant is terminal for the task that produced it: the adapter
/// never retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownstreamError {
    /// The dependency answered with a non-2xx status.
    #[error("HTTP error! status: {status}")]
    Status {
        /// The HTTP status code received.
        status: u16,
    },
    /// The call did not complete within its time budget.
    #[error("Network error: request timed out after {timeout:?}")]
    Timeout {
        /// The budget that was exceeded.
        timeout: Duration,
    },
    /// Connecting, sending or reading failed.
    #[error("Network error: {0}")]
    Transport(String),
    /// A 2xx response whose body was not valid JSON.
    #[error("Request failed: malformed response body: {0}")]
    Decode(String),
}

impl DownstreamError {
    /// Returns `true` if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DownstreamError::Timeout { .. })
    }

    /// Returns the HTTP status, if the dependency answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DownstreamError::Status { status } => Some(*status),
            _ => None,
        }
    }

    /// Returns a short label suitable for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DownstreamError::Status { .. } => "status",
            DownstreamError::Timeout { .. } => "timeout",
            DownstreamError::Transport(_) => "transport",
            DownstreamError::Decode(_) => "decode",
        }
    }
}

/// Errors raised while building a [`DelayClient`](crate::DelayClient).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The configured base URL could not be parsed.
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
