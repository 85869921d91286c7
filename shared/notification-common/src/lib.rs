//! Shared types and utilities for notification providers
//!
//! Every delivery transport (email, SMS) is exposed to the alert pipeline as a
//! [`ChannelAdapter`]. This crate owns that contract, the error taxonomy the
//! adapters report with, and the bounded retry helper used around `send`.

pub mod provider_base;
pub mod retry;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use provider_base::{ChannelAdapter, ProviderError};
pub use retry::{retry_with_backoff, IsRetryable, RetryConfig, RetryOutcome};
pub use types::*;
pub use validation::{mask_contact, validate_phone_number, ValidationError};
