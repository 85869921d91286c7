//! Inventory and alert records as seen by the scanner.
//!
//! Products and suppliers are owned by the inventory service and only read
//! here. Alerts are written once with status `New` and never touched again.

use chrono::{DateTime, Utc};
use notification_common::NotificationChannel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reorder_threshold: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
}

impl Product {
    /// Whole days left before expiry, rounded up so that anything expiring
    /// later today counts as one day.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|expires_at| {
            let secs = (expires_at - now).num_seconds();
            (secs + SECONDS_PER_DAY - 1).div_euclid(SECONDS_PER_DAY)
        })
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_threshold
    }

    /// Fraction of the reorder threshold still on hand; lower is more urgent
    pub fn stock_ratio(&self) -> f64 {
        if self.reorder_threshold > 0.0 {
            self.quantity / self.reorder_threshold
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Supplier {
    /// Contact address for a channel, ignoring blank fields
    pub fn contact_for(&self, channel: NotificationChannel) -> Option<&str> {
        let field = match channel {
            NotificationChannel::Email => self.email.as_deref(),
            NotificationChannel::Sms => self.phone.as_deref(),
        };
        field.map(str::trim).filter(|value| !value.is_empty())
    }
}

/// A product that crossed a threshold, paired with its supplier if known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default)]
    pub supplier: Option<Supplier>,
}

impl Candidate {
    pub fn new(product: Product, supplier: Option<Supplier>) -> Self {
        Self { product, supplier }
    }

    pub fn contact_for(&self, channel: NotificationChannel) -> Option<&str> {
        self.supplier
            .as_ref()
            .and_then(|supplier| supplier.contact_for(channel))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Expiry,
    LowStock,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Expiry => "expiry",
            AlertCategory::LowStock => "low_stock",
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    New,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub product_id: String,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub location: Option<String>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

/// Which threshold conditions a scan checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Expiry,
    LowStock,
    All,
}

impl CheckType {
    pub fn categories(&self) -> &'static [AlertCategory] {
        match self {
            CheckType::Expiry => &[AlertCategory::Expiry],
            CheckType::LowStock => &[AlertCategory::LowStock],
            CheckType::All => &[AlertCategory::Expiry, AlertCategory::LowStock],
        }
    }
}

impl std::str::FromStr for CheckType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expiry" => Ok(CheckType::Expiry),
            "low_stock" | "lowstock" | "low-stock" => Ok(CheckType::LowStock),
            "all" => Ok(CheckType::All),
            other => Err(format!("unknown check type '{}'", other)),
        }
    }
}

/// Input of a single scan-and-dispatch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub check_type: CheckType,
    #[serde(default)]
    pub window_days: Option<u32>,
}

impl ScanRequest {
    pub fn new(check_type: CheckType) -> Self {
        Self {
            check_type,
            window_days: None,
        }
    }

    pub fn with_window_days(mut self, window_days: u32) -> Self {
        self.window_days = Some(window_days);
        self
    }
}
