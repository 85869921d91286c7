use crate::error::ScanError;
use crate::models::{AlertCategory, Candidate};
use crate::product_source::ProductSource;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Selects the products that crossed a threshold, most urgent first.
pub struct ExpiryScanner {
    source: Arc<dyn ProductSource>,
}

impl ExpiryScanner {
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self { source }
    }

    /// Query the source for `category` and return the qualifying candidates.
    ///
    /// Rows returned by the source are filtered again here, so a source that
    /// over-selects cannot leak non-qualifying products into a scan.
    pub async fn scan(
        &self,
        window_days: u32,
        category: AlertCategory,
        now: DateTime<Utc>,
    ) -> Result<Vec<Candidate>> {
        if window_days == 0 {
            return Err(ScanError::InvalidWindow(window_days));
        }

        let mut candidates = match category {
            AlertCategory::Expiry => {
                let horizon = now + Duration::days(i64::from(window_days));
                let mut rows = self.source.query_expiring(window_days).await?;
                rows.retain(|c| {
                    c.product
                        .expires_at
                        .is_some_and(|expires_at| expires_at > now && expires_at <= horizon)
                });
                rows
            }
            AlertCategory::LowStock => {
                let mut rows = self.source.query_low_stock().await?;
                rows.retain(|c| c.product.is_low_stock());
                rows
            }
        };

        candidates.sort_by(|a, b| by_urgency(category, a, b));

        debug!(
            category = %category,
            window_days,
            candidates = candidates.len(),
            "scan selected candidates"
        );
        Ok(candidates)
    }
}

fn by_urgency(category: AlertCategory, a: &Candidate, b: &Candidate) -> Ordering {
    let primary = match category {
        AlertCategory::Expiry => a.product.expires_at.cmp(&b.product.expires_at),
        AlertCategory::LowStock => a
            .product
            .stock_ratio()
            .total_cmp(&b.product.stock_ratio()),
    };
    primary.then_with(|| a.product.id.cmp(&b.product.id))
}
