//! Error types for the widget API client.

use thiserror::Error;

/// Errors that can occur talking to the widget API.
#[derive(Debug, Error)]
pub enum WidgetApiError {
    /// The tenant is unknown to the server (404 on config fetch).
    #[error("chatbot not found: {0}")]
    TenantNotFound(String),

    /// The server answered with a non-success status.
    #[error("widget API unavailable: {0}")]
    ServiceUnavailable(String),

    /// HTTP request failed at the transport layer.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Request exceeded the configured bound.
    #[error("Request timed out")]
    Timeout,
}

impl WidgetApiError {
    /// Check if this error is worth retrying by sending again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ServiceUnavailable(_) | Self::HttpRequest(_)
        )
    }

    /// Fold a transport error into the taxonomy, surfacing timeouts
    /// distinctly so they resolve to the generic failure path instead of a
    /// stuck in-flight state.
    #[must_use]
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::HttpRequest(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(WidgetApiError::Timeout.is_retryable());
        assert!(WidgetApiError::ServiceUnavailable("503".to_string()).is_retryable());
        assert!(!WidgetApiError::TenantNotFound("acme".to_string()).is_retryable());
    }
}
