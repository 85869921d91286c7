use crate::config::ScannerConfig;
use crate::models::{AlertCategory, AlertSeverity, Candidate};
use chrono::{DateTime, Utc};

/// Maps how urgent a candidate is onto an alert severity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityPolicy {
    pub critical_within_days: i64,
    pub high_within_days: i64,
    pub low_stock_high_ratio: f64,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            critical_within_days: 7,
            high_within_days: 30,
            low_stock_high_ratio: 0.5,
        }
    }
}

impl From<&ScannerConfig> for SeverityPolicy {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            critical_within_days: config.critical_severity_days,
            high_within_days: config.high_severity_days,
            low_stock_high_ratio: config.low_stock_high_ratio,
        }
    }
}

impl SeverityPolicy {
    pub fn classify(
        &self,
        candidate: &Candidate,
        category: AlertCategory,
        now: DateTime<Utc>,
    ) -> AlertSeverity {
        let product = &candidate.product;
        match category {
            AlertCategory::Expiry => match product.days_until_expiry(now) {
                Some(days) if days <= self.critical_within_days => AlertSeverity::Critical,
                Some(days) if days <= self.high_within_days => AlertSeverity::High,
                Some(_) => AlertSeverity::Medium,
                None => AlertSeverity::Low,
            },
            AlertCategory::LowStock => {
                if product.quantity <= 0.0 {
                    AlertSeverity::Critical
                } else if product.stock_ratio() <= self.low_stock_high_ratio {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                }
            }
        }
    }
}
