//! Notification text built from a candidate. No I/O happens here.

use crate::models::{AlertCategory, AlertSeverity, Candidate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
}

pub fn compose_message(
    candidate: &Candidate,
    category: AlertCategory,
    severity: AlertSeverity,
    now: DateTime<Utc>,
) -> NotificationMessage {
    let product = &candidate.product;
    let headline = match category {
        AlertCategory::Expiry => format!("{} is expiring soon", product.name),
        AlertCategory::LowStock => format!("{} is low on stock", product.name),
    };
    let subject = match severity {
        AlertSeverity::Critical | AlertSeverity::High => {
            format!("[{}] {}", severity.label(), headline)
        }
        _ => headline,
    };

    let mut body = String::new();
    if let Some(supplier) = &candidate.supplier {
        let _ = writeln!(body, "Hello {},", supplier.name);
        body.push('\n');
    }
    let _ = writeln!(body, "Product: {} (SKU {})", product.name, product.sku);

    match category {
        AlertCategory::Expiry => {
            if let Some(expires_at) = product.expires_at {
                let days = product.days_until_expiry(now).unwrap_or_default();
                let _ = writeln!(
                    body,
                    "Expires: {} ({} day{} left)",
                    expires_at.format("%Y-%m-%d"),
                    days,
                    if days == 1 { "" } else { "s" }
                );
            }
            let _ = writeln!(body, "On hand: {}", quantity(product.quantity, &product.unit));
        }
        AlertCategory::LowStock => {
            let _ = writeln!(body, "On hand: {}", quantity(product.quantity, &product.unit));
            let _ = writeln!(
                body,
                "Reorder threshold: {}",
                quantity(product.reorder_threshold, &product.unit)
            );
        }
    }

    if let Some(location) = product.location.as_deref().filter(|l| !l.is_empty()) {
        let _ = writeln!(body, "Location: {}", location);
    }
    let _ = write!(body, "Severity: {}", severity.label());

    NotificationMessage { subject, body }
}

fn quantity(value: f64, unit: &str) -> String {
    let number = if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    };
    if unit.is_empty() {
        number
    } else {
        format!("{} {}", number, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{low_stock_product, product_expiring_in, supplier};

    #[test]
    fn test_expiry_message_mentions_days_left() {
        let now = Utc::now();
        let mut product = product_expiring_in("p1", 5, now);
        product.location = Some("Aisle 4".to_string());
        let candidate = Candidate::new(product, Some(supplier(Some("a@b.com"), None)));

        let message = compose_message(&candidate, AlertCategory::Expiry, AlertSeverity::Critical, now);

        assert_eq!(message.subject, "[CRITICAL] Product p1 is expiring soon");
        assert!(message.body.starts_with("Hello Acme Supply,"));
        assert!(message.body.contains("(5 days left)"));
        assert!(message.body.contains("SKU SKU-p1"));
        assert!(message.body.contains("Location: Aisle 4"));
    }

    #[test]
    fn test_low_stock_message_has_threshold() {
        let candidate = Candidate::new(low_stock_product("p2", 2.5, 10.0), None);

        let message = compose_message(
            &candidate,
            AlertCategory::LowStock,
            AlertSeverity::Medium,
            Utc::now(),
        );

        assert_eq!(message.subject, "Product p2 is low on stock");
        assert!(message.body.contains("On hand: 2.50 units"));
        assert!(message.body.contains("Reorder threshold: 10 units"));
        assert!(!message.body.contains("Hello"));
    }
}
