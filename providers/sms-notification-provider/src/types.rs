use serde::{Deserialize, Serialize};

/// Twilio concatenates long messages up to this many characters
pub const MAX_SMS_LENGTH: usize = 1600;

/// Form body for `POST /Accounts/{sid}/Messages.json`
#[derive(Debug, Clone, Serialize)]
pub struct TwilioSendMessageRequest {
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body")]
    pub body: String,
}

/// Message resource returned by Twilio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioMessageResponse {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Error body returned by Twilio on 4xx
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioErrorResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// SMS has no subject line, so the subject leads the text
pub fn compose_sms_text(subject: &str, body: &str) -> String {
    let text = if body.trim().is_empty() {
        subject.trim().to_string()
    } else {
        format!("{}\n{}", subject.trim(), body.trim())
    };

    if text.chars().count() <= MAX_SMS_LENGTH {
        return text;
    }

    let mut truncated: String = text.chars().take(MAX_SMS_LENGTH - 1).collect();
    truncated.push('…');
    truncated
}
