use config::{Config, ConfigError, Environment, File};
use notification_common::validate_phone_number;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub twilio_account_sid: Option<String>,
    /// Missing token leaves the channel unconfigured rather than failing startup
    #[serde(default)]
    pub twilio_auth_token: Option<String>,
    #[serde(default)]
    pub twilio_base_url: Option<String>,
    #[serde(default)]
    pub from_number: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_base_url: None,
            from_number: None,
            request_timeout_secs: 10,
        }
    }
}

impl SmsConfig {
    /// Create configuration from a properties map
    pub fn from_properties(
        props: &std::collections::HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| {
            props
                .get(key)
                .filter(|value| !value.trim().is_empty())
                .cloned()
        };

        Ok(Self {
            twilio_account_sid: non_blank("twilio_account_sid"),
            twilio_auth_token: non_blank("twilio_auth_token"),
            twilio_base_url: non_blank("twilio_base_url"),
            from_number: non_blank("from_number"),
            request_timeout_secs: props
                .get("request_timeout_secs")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().set_default("request_timeout_secs", 10)?;

        if let Ok(config_path) = env::var("SMS_CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("SMS")
                .separator("__")
                .try_parsing(true),
        );

        // Twilio's own variable names take precedence
        if let Ok(sid) = env::var("TWILIO_ACCOUNT_SID") {
            builder = builder.set_override("twilio_account_sid", sid)?;
        }
        if let Ok(token) = env::var("TWILIO_AUTH_TOKEN") {
            builder = builder.set_override("twilio_auth_token", token)?;
        }

        let config = builder.build()?;
        let mut sms_config: SmsConfig = config.try_deserialize()?;
        sms_config.twilio_account_sid = sms_config
            .twilio_account_sid
            .filter(|v| !v.trim().is_empty());
        sms_config.twilio_auth_token = sms_config
            .twilio_auth_token
            .filter(|v| !v.trim().is_empty());

        Ok(sms_config)
    }

    /// All three of account, token and sender number are needed to send
    pub fn is_configured(&self) -> bool {
        self.twilio_account_sid.is_some()
            && self.twilio_auth_token.is_some()
            && self.from_number.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(from) = &self.from_number {
            validate_phone_number(from).map_err(|e| format!("Invalid from number: {}", e))?;
        }

        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
