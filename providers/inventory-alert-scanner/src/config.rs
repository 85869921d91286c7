//! Configuration for the inventory alert scanner

use crate::models::CheckType;
use notification_common::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the scanner service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    /// Redis connection URL (alert records + per-day deduplication keys)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Base URL of the inventory API serving product queries
    #[serde(default = "default_inventory_api_url")]
    pub inventory_api_url: String,

    /// Bearer token for the inventory API
    #[serde(default)]
    pub inventory_api_token: Option<String>,

    /// Expiry window used when a request does not carry one
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    /// Which checks the periodic runner performs
    #[serde(default = "default_check_type")]
    pub check_type: CheckType,

    /// Seconds between two periodic scans
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Overall deadline for one scan
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,

    /// Maximum concurrent sends across all channels
    #[serde(default = "default_max_in_flight_sends")]
    pub max_in_flight_sends: usize,

    /// Maximum concurrent alert-store inserts
    #[serde(default = "default_max_concurrent_records")]
    pub max_concurrent_records: usize,

    /// Number of attempts per send, the first one included
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Expiring within this many days is high severity
    #[serde(default = "default_high_severity_days")]
    pub high_severity_days: i64,

    /// Expiring within this many days is critical severity
    #[serde(default = "default_critical_severity_days")]
    pub critical_severity_days: i64,

    /// Stock at or below this fraction of the reorder threshold is high severity
    #[serde(default = "default_low_stock_high_ratio")]
    pub low_stock_high_ratio: f64,

    /// Lifetime of a per-day deduplication key
    #[serde(default = "default_dedup_ttl_secs")]
    pub dedup_ttl_secs: u64,

    /// Redis connection pool size
    #[serde(default = "default_pool_size")]
    pub redis_pool_size: usize,

    /// HTTP timeout for inventory API calls
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_ms: u64,
}

impl ScannerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Load configuration from a properties map.
    ///
    /// Unknown keys are ignored and unparsable values fall back to defaults.
    pub fn from_properties(
        props: &std::collections::HashMap<String, String>,
    ) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(v) = props.get("redis_url") {
            config.redis_url = v.clone();
        }
        if let Some(v) = props.get("inventory_api_url") {
            config.inventory_api_url = v.clone();
        }
        config.inventory_api_token = props
            .get("inventory_api_token")
            .filter(|v| !v.trim().is_empty())
            .cloned();
        if let Some(v) = props.get("check_type") {
            config.check_type = v.parse()?;
        }

        fn parsed<T: std::str::FromStr>(
            props: &std::collections::HashMap<String, String>,
            key: &str,
            default: T,
        ) -> T {
            props
                .get(key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        config.default_window_days =
            parsed(props, "default_window_days", config.default_window_days);
        config.scan_interval_secs = parsed(props, "scan_interval_secs", config.scan_interval_secs);
        config.scan_timeout_secs = parsed(props, "scan_timeout_secs", config.scan_timeout_secs);
        config.max_in_flight_sends =
            parsed(props, "max_in_flight_sends", config.max_in_flight_sends);
        config.max_concurrent_records =
            parsed(props, "max_concurrent_records", config.max_concurrent_records);
        config.retry_attempts = parsed(props, "retry_attempts", config.retry_attempts);
        config.retry_initial_delay_ms =
            parsed(props, "retry_initial_delay_ms", config.retry_initial_delay_ms);
        config.retry_max_delay_ms = parsed(props, "retry_max_delay_ms", config.retry_max_delay_ms);
        config.high_severity_days = parsed(props, "high_severity_days", config.high_severity_days);
        config.critical_severity_days =
            parsed(props, "critical_severity_days", config.critical_severity_days);
        config.low_stock_high_ratio =
            parsed(props, "low_stock_high_ratio", config.low_stock_high_ratio);
        config.dedup_ttl_secs = parsed(props, "dedup_ttl_secs", config.dedup_ttl_secs);
        config.redis_pool_size = parsed(props, "redis_pool_size", config.redis_pool_size);
        config.connection_timeout_ms =
            parsed(props, "connection_timeout_ms", config.connection_timeout_ms);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_window_days == 0 {
            return Err("default_window_days must be greater than 0".to_string());
        }
        if self.max_in_flight_sends == 0 {
            return Err("max_in_flight_sends must be greater than 0".to_string());
        }
        if self.max_concurrent_records == 0 {
            return Err("max_concurrent_records must be greater than 0".to_string());
        }
        if self.retry_attempts == 0 {
            return Err("retry_attempts must be at least 1".to_string());
        }
        if self.critical_severity_days > self.high_severity_days {
            return Err("critical_severity_days cannot exceed high_severity_days".to_string());
        }
        if self.dedup_ttl_secs < 86_400 {
            return Err("dedup_ttl_secs must cover at least one day".to_string());
        }
        Ok(())
    }

    /// A single attempt disables backoff entirely
    pub fn retry_config(&self) -> RetryConfig {
        if self.retry_attempts <= 1 {
            return RetryConfig::no_retry();
        }
        RetryConfig::new(
            self.retry_attempts,
            self.retry_initial_delay_ms,
            self.retry_max_delay_ms,
        )
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            inventory_api_url: default_inventory_api_url(),
            inventory_api_token: None,
            default_window_days: default_window_days(),
            check_type: default_check_type(),
            scan_interval_secs: default_scan_interval_secs(),
            scan_timeout_secs: default_scan_timeout_secs(),
            max_in_flight_sends: default_max_in_flight_sends(),
            max_concurrent_records: default_max_concurrent_records(),
            retry_attempts: default_retry_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            high_severity_days: default_high_severity_days(),
            critical_severity_days: default_critical_severity_days(),
            low_stock_high_ratio: default_low_stock_high_ratio(),
            dedup_ttl_secs: default_dedup_ttl_secs(),
            redis_pool_size: default_pool_size(),
            connection_timeout_ms: default_connection_timeout(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_inventory_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_window_days() -> u32 {
    30
}

fn default_check_type() -> CheckType {
    CheckType::All
}

fn default_scan_interval_secs() -> u64 {
    3600
}

fn default_scan_timeout_secs() -> u64 {
    120
}

fn default_max_in_flight_sends() -> usize {
    8
}

fn default_max_concurrent_records() -> usize {
    4
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    5000
}

fn default_high_severity_days() -> i64 {
    30
}

fn default_critical_severity_days() -> i64 {
    7
}

fn default_low_stock_high_ratio() -> f64 {
    0.5
}

fn default_dedup_ttl_secs() -> u64 {
    60 * 60 * 48
}

fn default_pool_size() -> usize {
    10
}

fn default_connection_timeout() -> u64 {
    5000
}
