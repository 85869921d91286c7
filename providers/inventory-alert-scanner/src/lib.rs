//! Inventory Alert Scanner
//!
//! Periodically scans the inventory service for products that are about to
//! expire or have fallen below their reorder level, records one alert per
//! product, category and day, and notifies the product's supplier over every
//! configured channel (email, SMS). One scan returns a [`ScanReport`] that
//! lists an outcome for every (product, channel) pair in candidate order.

pub mod aggregator;
pub mod alert_recorder;
pub mod alert_store;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod expiry_scanner;
pub mod message;
pub mod models;
pub mod orchestrator;
pub mod product_source;
pub mod redis_ops;
pub mod report;
pub mod severity;

#[cfg(test)]
mod test_support;

pub use alert_recorder::{AlertRecordStatus, AlertRecorder};
pub use alert_store::{AlertStore, InsertOutcome, RedisAlertStore};
pub use config::ScannerConfig;
pub use dispatcher::{DeliveryStatus, DispatchOutcome, NotificationDispatcher};
pub use error::{AlertStoreError, ScanError};
pub use expiry_scanner::ExpiryScanner;
pub use models::{AlertCategory, AlertSeverity, Candidate, CheckType, Product, ScanRequest, Supplier};
pub use orchestrator::ScanOrchestrator;
pub use product_source::{HttpProductSource, ProductSource};
pub use redis_ops::RedisManager;
pub use report::{ScanReport, ScanStatus, SectionReport};
pub use severity::SeverityPolicy;

// Re-export Result type for convenience
pub type Result<T> = std::result::Result<T, ScanError>;
