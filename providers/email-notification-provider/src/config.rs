use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Missing key leaves the channel unconfigured rather than failing startup
    #[serde(default)]
    pub resend_api_key: Option<String>,
    #[serde(default)]
    pub resend_base_url: Option<String>,
    pub default_from_email: String,
    pub default_from_name: String,
    pub request_timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            resend_base_url: None,
            default_from_email: "alerts@inventory.local".to_string(),
            default_from_name: "Inventory Alerts".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl EmailConfig {
    /// Create configuration from a properties map
    pub fn from_properties(
        props: &std::collections::HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            resend_api_key: props
                .get("resend_api_key")
                .or_else(|| props.get("RESEND_API_KEY"))
                .filter(|key| !key.trim().is_empty())
                .cloned(),
            resend_base_url: props.get("resend_base_url").cloned(),
            default_from_email: props
                .get("default_from_email")
                .cloned()
                .unwrap_or(defaults.default_from_email),
            default_from_name: props
                .get("default_from_name")
                .cloned()
                .unwrap_or(defaults.default_from_name),
            request_timeout_secs: props
                .get("request_timeout_secs")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("default_from_email", defaults.default_from_email)?
            .set_default("default_from_name", defaults.default_from_name)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?;

        // Try to load from config file if it exists
        if let Ok(config_path) = env::var("EMAIL_CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path));
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("EMAIL")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(api_key) = env::var("RESEND_API_KEY") {
            builder = builder.set_override("resend_api_key", api_key)?;
        }

        let config = builder.build()?;
        let mut email_config: EmailConfig = config.try_deserialize()?;
        email_config.resend_api_key = email_config
            .resend_api_key
            .filter(|key| !key.trim().is_empty());

        Ok(email_config)
    }

    pub fn is_configured(&self) -> bool {
        self.resend_api_key.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_from_email.is_empty() {
            return Err("Default from email is required".to_string());
        }

        if !email_address::EmailAddress::is_valid(&self.default_from_email) {
            return Err(format!(
                "Invalid default from email: {}",
                self.default_from_email
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
