pub mod client;
pub mod config;
pub mod provider;
pub mod types;

pub use client::TwilioClient;
pub use config::SmsConfig;
pub use provider::SmsAdapter;
pub use types::{compose_sms_text, TwilioMessageResponse, MAX_SMS_LENGTH};
