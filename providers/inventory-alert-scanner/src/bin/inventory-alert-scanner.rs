//! # Inventory Alert Scanner Binary
//!
//! Runs the scan-and-dispatch pipeline on a fixed interval. Configuration is
//! read from the environment (`ScannerConfig` via envy, `EMAIL__*` / `SMS__*`
//! for the channel adapters).

use anyhow::{Context, Result};
use email_notification_provider::{EmailAdapter, EmailConfig};
use notification_common::ChannelAdapter;
use sms_notification_provider::{SmsAdapter, SmsConfig};
use std::sync::Arc;
use tracing::{info, warn};

use inventory_alert_scanner::{
    AlertRecorder, ExpiryScanner, HttpProductSource, NotificationDispatcher, RedisAlertStore,
    RedisManager, ScanOrchestrator, ScanRequest, ScannerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with environment filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("inventory_alert_scanner=info".parse()?),
        )
        .init();

    info!("Starting Inventory Alert Scanner");

    let config = ScannerConfig::from_env().context("Failed to load scanner configuration")?;
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid scanner configuration")?;

    let email_config = EmailConfig::from_env().context("Failed to load email configuration")?;
    let sms_config = SmsConfig::from_env().context("Failed to load SMS configuration")?;

    let adapters: Vec<Arc<dyn ChannelAdapter>> = vec![
        Arc::new(EmailAdapter::new(email_config).context("Failed to create email adapter")?),
        Arc::new(SmsAdapter::new(sms_config).context("Failed to create SMS adapter")?),
    ];
    for adapter in &adapters {
        match adapter.health_check().await {
            Ok(true) => info!(channel = %adapter.channel(), "channel ready"),
            Ok(false) => warn!(
                channel = %adapter.channel(),
                "channel not configured, its notifications will be skipped"
            ),
            Err(e) => warn!(channel = %adapter.channel(), "channel health check failed: {}", e),
        }
    }

    let source = HttpProductSource::new(
        &config.inventory_api_url,
        config.inventory_api_token.clone(),
        std::time::Duration::from_millis(config.connection_timeout_ms),
    )
    .context("Failed to create inventory API client")?;

    let redis = Arc::new(
        RedisManager::new(&config)
            .await
            .context("Failed to connect to Redis")?,
    );
    let store = RedisAlertStore::new(redis, config.dedup_ttl_secs);

    let orchestrator = ScanOrchestrator::new(
        ExpiryScanner::new(Arc::new(source)),
        AlertRecorder::new(Arc::new(store)),
        NotificationDispatcher::new(
            adapters,
            config.retry_config(),
            config.max_in_flight_sends,
        ),
        &config,
    );

    let request = ScanRequest::new(config.check_type).with_window_days(config.default_window_days);
    info!(
        check_type = ?request.check_type,
        interval_secs = config.scan_interval_secs,
        "Scanner ready"
    );

    tokio::select! {
        _ = orchestrator.run_loop(config.scan_interval(), request) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Inventory Alert Scanner shutdown complete");
    Ok(())
}
