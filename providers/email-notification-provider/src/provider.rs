use crate::{client::ResendClient, config::EmailConfig, formatter::EmailFormatter};
use async_trait::async_trait;
use notification_common::{
    mask_contact, ChannelAdapter, DeliveryReceipt, NotificationChannel, ProviderError,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Email channel backed by the Resend API.
///
/// Built once at startup and shared by the dispatcher. Without an API key the
/// adapter still exists so that every email outcome is reported as skipped.
pub struct EmailAdapter {
    client: Option<ResendClient>,
    formatter: EmailFormatter,
    from_email: String,
}

impl EmailAdapter {
    pub fn new(config: EmailConfig) -> Result<Self, ProviderError> {
        config.validate().map_err(|e| {
            ProviderError::InternalError(format!("Config validation failed: {}", e))
        })?;

        let client = match config.resend_api_key.clone() {
            Some(api_key) => Some(ResendClient::new(
                api_key,
                config.resend_base_url.clone(),
                Some(config.default_from_name.clone()),
                Duration::from_secs(config.request_timeout_secs),
            )?),
            None => {
                warn!("RESEND_API_KEY not set, email channel is unconfigured");
                None
            }
        };

        info!(
            configured = client.is_some(),
            from = %config.default_from_email,
            "Email adapter initialized"
        );

        Ok(Self {
            client,
            formatter: EmailFormatter::new()?,
            from_email: config.default_from_email,
        })
    }
}

#[async_trait]
impl ChannelAdapter for EmailAdapter {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn send(
        &self,
        target: &str,
        subject: &str,
        body: &str,
    ) -> Result<DeliveryReceipt, ProviderError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ProviderError::ChannelUnconfigured {
                channel: NotificationChannel::Email,
                reason: "no Resend API key".to_string(),
            })?;

        let target = target.trim();
        if !email_address::EmailAddress::is_valid(target) {
            return Err(ProviderError::InvalidTarget(format!(
                "Invalid email address: {}",
                mask_contact(target)
            )));
        }

        let payload = self
            .formatter
            .build_payload(target, &self.from_email, subject, body);

        debug!("Sending email to {}", mask_contact(target));
        let response = client.send(payload).await?;
        debug!(
            status = response.status_code,
            "Resend accepted email for {}",
            mask_contact(target)
        );

        Ok(DeliveryReceipt::new(
            NotificationChannel::Email,
            response.message_id,
        ))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        match &self.client {
            Some(client) => client.health_check().await,
            None => Ok(false),
        }
    }
}
