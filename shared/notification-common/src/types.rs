//! Core types for notification delivery
//!
//! These are the values exchanged between the alert pipeline and the channel
//! adapters. Anything transport-specific stays inside the provider crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification channels supported by the system
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Sms,
}

impl NotificationChannel {
    /// Get channel name as lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationChannel::Email => write!(f, "Email"),
            NotificationChannel::Sms => write!(f, "SMS"),
        }
    }
}

/// Acknowledgement returned by a transport that accepted a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub channel: NotificationChannel,
    /// Provider-assigned id (Resend email id, Twilio message SID)
    pub message_id: Option<String>,
    pub accepted_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn new(channel: NotificationChannel, message_id: Option<String>) -> Self {
        Self {
            channel,
            message_id,
            accepted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_serializes_lowercase() {
        assert_eq!(NotificationChannel::Sms.as_str(), "sms");
        assert_eq!(NotificationChannel::Sms.to_string(), "SMS");
    }

    #[test]
    fn test_channel_ordering_is_stable() {
        let mut channels = vec![NotificationChannel::Sms, NotificationChannel::Email];
        channels.sort();
        assert_eq!(
            channels,
            vec![NotificationChannel::Email, NotificationChannel::Sms]
        );
    }
}
