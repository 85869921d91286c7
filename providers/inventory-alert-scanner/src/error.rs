//! Error types for the inventory alert scanner

use crate::models::AlertCategory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// The product query could not run at all; aborts the affected sub-scan
    #[error("Product source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Invalid scan window: {0} days (must be greater than zero)")]
    InvalidWindow(u32),

    #[error("Timeout error: {category} scan did not fetch candidates within {timeout_ms}ms")]
    Timeout {
        category: AlertCategory,
        timeout_ms: u64,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ScanError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::SourceUnavailable(_) | ScanError::Timeout { .. }
        )
    }
}

/// Failures of the alert store other than a uniqueness rejection
#[derive(Error, Debug)]
pub enum AlertStoreError {
    #[error("Redis connection error: {0}")]
    RedisConnection(#[from] redis::RedisError),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}
