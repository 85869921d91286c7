use crate::types::{TwilioErrorResponse, TwilioMessageResponse, TwilioSendMessageRequest};
use notification_common::{mask_contact, ProviderError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Twilio Programmable Messaging client
pub struct TwilioClient {
    http_client: Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

impl TwilioClient {
    pub fn new(
        account_sid: String,
        auth_token: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http_client = Client::builder().timeout(timeout).build().map_err(|e| {
            ProviderError::InternalError(format!("Failed to create HTTP client: {}", e))
        })?;

        let base_url = base_url.unwrap_or_else(|| "https://api.twilio.com".to_string());

        Ok(Self {
            http_client,
            account_sid,
            auth_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn account_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}", self.base_url, self.account_sid)
    }

    /// Send message via Twilio Messages API
    pub async fn send_message(
        &self,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<TwilioMessageResponse, ProviderError> {
        let request = TwilioSendMessageRequest {
            to: to.to_string(),
            from: from.to_string(),
            body: body.to_string(),
        };

        debug!("Sending SMS to {}", mask_contact(to));

        let response = self
            .http_client
            .post(format!("{}/Messages.json", self.account_url()))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send Twilio API request: {}", e);
                if e.is_timeout() {
                    ProviderError::NetworkTimeout
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let message: TwilioMessageResponse = response.json().await.map_err(|e| {
                error!("Failed to parse Twilio API response: {}", e);
                ProviderError::MalformedResponse(format!("Invalid response format: {}", e))
            })?;

            if let Some(code) = message.error_code {
                let reason = message
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string());
                error!("Twilio accepted request but reported error {}: {}", code, reason);
                return Err(ProviderError::Rejected {
                    status: status.as_u16(),
                    message: reason,
                });
            }

            info!("Successfully queued SMS {} to {}", message.sid, mask_contact(to));
            return Ok(message);
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                error!("Authentication failed with Twilio");
                Err(ProviderError::InvalidAuthentication)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);

                warn!("Twilio rate limit exceeded, retry after {} seconds", retry_after);
                Err(ProviderError::RateLimitExceeded {
                    retry_after: Duration::from_secs(retry_after),
                })
            }
            status if status.is_server_error() => {
                error!("Twilio service error: {}", status);
                Err(ProviderError::ServiceUnavailable {
                    status: status.as_u16(),
                })
            }
            _ => {
                let error_body = response.text().await.unwrap_or_default();
                let message = match serde_json::from_str::<TwilioErrorResponse>(&error_body) {
                    Ok(err) => match err.code {
                        Some(code) => format!("{} (code {})", err.message, code),
                        None => err.message,
                    },
                    Err(_) => error_body,
                };
                error!("Twilio rejected SMS ({}): {}", status, message);
                Err(ProviderError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Fetch the account resource to verify credentials
    pub async fn health_check(&self) -> Result<bool, ProviderError> {
        let response = self
            .http_client
            .get(format!("{}.json", self.account_url()))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| {
                warn!("Health check failed: {}", e);
                ProviderError::NetworkError(e.to_string())
            })?;

        Ok(response.status() == StatusCode::OK)
    }
}
