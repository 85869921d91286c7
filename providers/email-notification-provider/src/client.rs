use crate::formatter::EmailPayload;
use notification_common::ProviderError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendResponseWrapper {
    pub message_id: Option<String>,
    pub status_code: u16,
}

#[derive(Debug, Serialize)]
struct ResendRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResendError {
    #[serde(default)]
    message: String,
}

pub struct ResendClient {
    client: Client,
    api_key: String,
    base_url: String,
    default_from_name: String,
}

impl ResendClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_from_name: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ProviderError::InternalError(format!("Failed to create HTTP client: {}", e))
        })?;

        let base_url = base_url.unwrap_or_else(|| "https://api.resend.com".to_string());
        let default_from_name =
            default_from_name.unwrap_or_else(|| "Inventory Alerts".to_string());

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_from_name,
        })
    }

    pub async fn send(
        &self,
        payload: EmailPayload,
    ) -> Result<ResendResponseWrapper, ProviderError> {
        let request = self.build_request(payload);

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send email request: {}", e);
                if e.is_timeout() {
                    ProviderError::NetworkTimeout
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let resend_response: ResendResponse = response.json().await.map_err(|e| {
                error!("Failed to parse Resend response: {}", e);
                ProviderError::MalformedResponse(format!("Invalid response format: {}", e))
            })?;
            debug!("Email sent successfully with ID: {}", resend_response.id);
            return Ok(ResendResponseWrapper {
                message_id: Some(resend_response.id),
                status_code: status.as_u16(),
            });
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                error!("Authentication failed with Resend");
                Err(ProviderError::InvalidAuthentication)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);

                warn!("Rate limit exceeded, retry after {} seconds", retry_after);
                Err(ProviderError::RateLimitExceeded {
                    retry_after: Duration::from_secs(retry_after),
                })
            }
            status if status.is_server_error() => {
                error!("Resend service error: {}", status);
                Err(ProviderError::ServiceUnavailable {
                    status: status.as_u16(),
                })
            }
            _ => {
                let error_body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ResendError>(&error_body)
                    .map(|e| e.message)
                    .unwrap_or(error_body);
                error!("Resend rejected email ({}): {}", status, message);
                Err(ProviderError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    pub async fn health_check(&self) -> Result<bool, ProviderError> {
        // Resend doesn't have a dedicated health check endpoint
        // We'll check if the API key is valid by hitting the domains endpoint
        let response = self
            .client
            .get(format!("{}/domains", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| {
                warn!("Health check failed: {}", e);
                ProviderError::NetworkError(e.to_string())
            })?;

        Ok(response.status() == StatusCode::OK)
    }

    fn build_request(&self, payload: EmailPayload) -> ResendRequest {
        // Resend uses "Name <email>" format for from address
        let from = format!("{} <{}>", self.default_from_name, payload.from);

        ResendRequest {
            from,
            to: vec![payload.to],
            subject: payload.subject,
            text: Some(payload.text_content),
            html: payload.html_content,
            reply_to: payload.reply_to,
        }
    }
}
