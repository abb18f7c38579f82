use thiserror::Error;

use crate::models::series::SeriesIntegrityError;

/// Errors that can occur within a [`SeriesProvider`](super::SeriesProvider)
/// implementation, classified into the kinds callers react to.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The requested series (or release/category/source) does not exist.
    #[error("Series not found: {series_id}")]
    NotFound { series_id: String },

    /// The request was rejected by the provider as malformed.
    #[error("Invalid request argument: {0}")]
    InvalidArgument(String),

    /// The provider is unreachable or returned a server-side failure.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The provider throttled us beyond the retry budget.
    #[error("Rate limited by upstream")]
    RateLimited,

    /// The credential is missing or rejected. Never retried.
    #[error("API credential missing or rejected: {0}")]
    AuthMissing(String),

    /// An error during the HTTP exchange (network failure, timeout).
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    /// The decoded series violated the ordering invariant.
    #[error(transparent)]
    Integrity(#[from] SeriesIntegrityError),
}

impl GatewayError {
    /// Stable kind string used in per-series failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound { .. } => "not_found",
            GatewayError::InvalidArgument(_) => "invalid_argument",
            GatewayError::UpstreamUnavailable(_) => "upstream_unavailable",
            GatewayError::RateLimited => "rate_limited",
            GatewayError::AuthMissing(_) => "auth_missing",
            GatewayError::Transport(_) => "upstream_unavailable",
            GatewayError::Decode(_) => "upstream_unavailable",
            GatewayError::Integrity(_) => "upstream_unavailable",
        }
    }

    /// Whether the retry/backoff budget applies to this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited | GatewayError::UpstreamUnavailable(_)
        )
    }
}
