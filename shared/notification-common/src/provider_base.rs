use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::retry::IsRetryable;
use crate::types::{DeliveryReceipt, NotificationChannel};

/// Capability every delivery transport exposes to the alert pipeline.
///
/// Implementations must not keep mutable state between calls: the dispatcher
/// invokes `send` concurrently from many tasks without any locking.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Get the channel this adapter handles
    fn channel(&self) -> NotificationChannel;

    /// Whether a transport credential is available. An unconfigured adapter
    /// answers every `send` with [`ProviderError::ChannelUnconfigured`].
    fn is_configured(&self) -> bool;

    /// Deliver one message to `target` (an email address or a phone number)
    async fn send(
        &self,
        target: &str,
        subject: &str,
        body: &str,
    ) -> Result<DeliveryReceipt, ProviderError>;

    /// Check if the external service is reachable with the current credential
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(self.is_configured())
    }
}

/// Provider error types
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    // Configuration errors, never retried
    #[error("Channel {channel} is not configured: {reason}")]
    ChannelUnconfigured {
        channel: NotificationChannel,
        reason: String,
    },

    #[error("Invalid target address: {0}")]
    InvalidTarget(String),

    // Retryable transport errors
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded { retry_after: Duration },

    #[error("Network timeout")]
    NetworkTimeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Service unavailable (status {status})")]
    ServiceUnavailable { status: u16 },

    // Non-retryable transport errors
    #[error("Invalid API key or authentication")]
    InvalidAuthentication,

    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ProviderError {
    /// Missing credentials are a skip for the caller, not a delivery failure
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, ProviderError::ChannelUnconfigured { .. })
    }

    /// Get error code for logging/monitoring
    pub fn error_code(&self) -> &'static str {
        match self {
            ProviderError::ChannelUnconfigured { .. } => "CHANNEL_UNCONFIGURED",
            ProviderError::InvalidTarget(_) => "INVALID_TARGET",
            ProviderError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            ProviderError::NetworkTimeout => "NETWORK_TIMEOUT",
            ProviderError::NetworkError(_) => "NETWORK_ERROR",
            ProviderError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            ProviderError::InvalidAuthentication => "INVALID_AUTHENTICATION",
            ProviderError::Rejected { .. } => "REJECTED",
            ProviderError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            ProviderError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl IsRetryable for ProviderError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimitExceeded { .. }
                | ProviderError::NetworkTimeout
                | ProviderError::NetworkError(_)
                | ProviderError::ServiceUnavailable { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
