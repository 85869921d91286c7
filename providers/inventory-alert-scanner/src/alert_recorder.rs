use crate::alert_store::{AlertStore, InsertOutcome};
use crate::error::AlertStoreError;
use crate::models::{Alert, AlertCategory, AlertSeverity, AlertStatus, Candidate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertRecordStatus {
    Created,
    AlreadyExists,
}

/// Persists at most one alert per (product, category, UTC day).
///
/// A rejected duplicate is a normal outcome. Any other store failure is
/// returned to the caller, which treats it as a warning on that product.
pub struct AlertRecorder {
    store: Arc<dyn AlertStore>,
}

impl AlertRecorder {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        candidate: &Candidate,
        category: AlertCategory,
        severity: AlertSeverity,
        now: DateTime<Utc>,
    ) -> Result<AlertRecordStatus, AlertStoreError> {
        let alert = build_alert(candidate, category, severity, now);

        match self.store.insert_if_absent(&alert, now.date_naive()).await {
            Ok(InsertOutcome::Created) => {
                debug!(product_id = %alert.product_id, %category, "alert created");
                Ok(AlertRecordStatus::Created)
            }
            Ok(InsertOutcome::AlreadyExists) => {
                debug!(product_id = %alert.product_id, %category, "alert already recorded today");
                Ok(AlertRecordStatus::AlreadyExists)
            }
            Err(e) => {
                warn!(product_id = %alert.product_id, %category, "failed to record alert: {}", e);
                Err(e)
            }
        }
    }
}

fn build_alert(
    candidate: &Candidate,
    category: AlertCategory,
    severity: AlertSeverity,
    now: DateTime<Utc>,
) -> Alert {
    let product = &candidate.product;
    let (title, description) = match category {
        AlertCategory::Expiry => {
            let days = product.days_until_expiry(now).unwrap_or_default();
            (
                format!("{} expiring in {} days", product.name, days),
                format!(
                    "{} ({}) expires in {} days with {} {} on hand",
                    product.name, product.sku, days, product.quantity, product.unit
                ),
            )
        }
        AlertCategory::LowStock => (
            format!("{} below reorder level", product.name),
            format!(
                "{} ({}) has {} {} on hand, reorder threshold is {}",
                product.name, product.sku, product.quantity, product.unit, product.reorder_threshold
            ),
        ),
    };

    Alert {
        id: Uuid::new_v4(),
        product_id: product.id.clone(),
        title,
        description,
        severity,
        category,
        location: product.location.clone(),
        status: AlertStatus::New,
        created_at: now,
    }
}
