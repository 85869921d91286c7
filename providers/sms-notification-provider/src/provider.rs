use crate::{client::TwilioClient, config::SmsConfig, types::compose_sms_text};
use async_trait::async_trait;
use notification_common::{
    mask_contact, validate_phone_number, ChannelAdapter, DeliveryReceipt, NotificationChannel,
    ProviderError,
};
use std::time::Duration;
use tracing::{debug, info, warn};

struct Sender {
    client: TwilioClient,
    from_number: String,
}

/// SMS channel backed by Twilio
pub struct SmsAdapter {
    sender: Option<Sender>,
}

impl SmsAdapter {
    pub fn new(config: SmsConfig) -> Result<Self, ProviderError> {
        config.validate().map_err(|e| {
            ProviderError::InternalError(format!("Config validation failed: {}", e))
        })?;

        let sender = match (
            config.twilio_account_sid,
            config.twilio_auth_token,
            config.from_number,
        ) {
            (Some(sid), Some(token), Some(from)) => Some(Sender {
                client: TwilioClient::new(
                    sid,
                    token,
                    config.twilio_base_url,
                    Duration::from_secs(config.request_timeout_secs),
                )?,
                from_number: validate_phone_number(&from)
                    .map_err(|e| ProviderError::InternalError(e.to_string()))?,
            }),
            _ => {
                warn!("Twilio credentials incomplete, SMS channel is unconfigured");
                None
            }
        };

        info!(configured = sender.is_some(), "SMS adapter initialized");

        Ok(Self { sender })
    }
}

#[async_trait]
impl ChannelAdapter for SmsAdapter {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Sms
    }

    fn is_configured(&self) -> bool {
        self.sender.is_some()
    }

    async fn send(
        &self,
        target: &str,
        subject: &str,
        body: &str,
    ) -> Result<DeliveryReceipt, ProviderError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ProviderError::ChannelUnconfigured {
                channel: NotificationChannel::Sms,
                reason: "Twilio credentials or sender number missing".to_string(),
            })?;

        let to = validate_phone_number(target)
            .map_err(|e| ProviderError::InvalidTarget(e.to_string()))?;
        let text = compose_sms_text(subject, body);

        debug!("Sending SMS ({} chars) to {}", text.chars().count(), mask_contact(&to));
        let message = sender
            .client
            .send_message(&sender.from_number, &to, &text)
            .await?;

        Ok(DeliveryReceipt::new(
            NotificationChannel::Sms,
            Some(message.sid),
        ))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        match &self.sender {
            Some(sender) => sender.client.health_check().await,
            None => Ok(false),
        }
    }
}
