//! Structured result of a scan, returned to the caller and serializable so it
//! can be persisted or published as-is.

use crate::alert_recorder::AlertRecordStatus;
use crate::dispatcher::{DeliveryStatus, DispatchOutcome};
use crate::models::{AlertCategory, CheckType};
use chrono::{DateTime, Utc};
use notification_common::NotificationChannel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTally {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub not_attempted: usize,
}

impl ChannelTally {
    pub fn add(&mut self, status: DeliveryStatus) {
        match status {
            DeliveryStatus::Sent => self.sent += 1,
            DeliveryStatus::Skipped => self.skipped += 1,
            DeliveryStatus::Failed => self.failed += 1,
            DeliveryStatus::NotAttempted => self.not_attempted += 1,
        }
    }

    pub fn merge(&mut self, other: &ChannelTally) {
        self.sent += other.sent;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.not_attempted += other.not_attempted;
    }

    pub fn total(&self) -> usize {
        self.sent + self.skipped + self.failed + self.not_attempted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertEntryStatus {
    Created,
    AlreadyExists,
    Failed,
    NotAttempted,
}

impl From<AlertRecordStatus> for AlertEntryStatus {
    fn from(status: AlertRecordStatus) -> Self {
        match status {
            AlertRecordStatus::Created => AlertEntryStatus::Created,
            AlertRecordStatus::AlreadyExists => AlertEntryStatus::AlreadyExists,
        }
    }
}

/// Alert bookkeeping result for one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecordEntry {
    pub product_id: String,
    pub status: AlertEntryStatus,
    /// Set when recording failed; never blocks dispatch
    pub recording_warning: Option<String>,
}

impl AlertRecordEntry {
    pub fn recorded(product_id: &str, status: AlertRecordStatus) -> Self {
        Self {
            product_id: product_id.to_string(),
            status: status.into(),
            recording_warning: None,
        }
    }

    pub fn warning(product_id: &str, status: AlertEntryStatus, warning: String) -> Self {
        Self {
            product_id: product_id.to_string(),
            status,
            recording_warning: Some(warning),
        }
    }
}

/// Report of one category sub-scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub category: AlertCategory,
    pub window_days: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub candidates_scanned: usize,
    /// Ordered by candidate position, then channel
    pub outcomes: Vec<DispatchOutcome>,
    /// One entry per candidate, in candidate order
    pub alerts: Vec<AlertRecordEntry>,
    pub totals: BTreeMap<NotificationChannel, ChannelTally>,
    pub aborted: bool,
    pub abort_reason: Option<String>,
    /// The scan deadline passed before every pair was attempted
    pub timed_out: bool,
}

impl SectionReport {
    pub fn aborted(
        category: AlertCategory,
        window_days: Option<u32>,
        started_at: DateTime<Utc>,
        reason: String,
    ) -> Self {
        Self {
            category,
            window_days,
            started_at,
            finished_at: Utc::now(),
            candidates_scanned: 0,
            outcomes: Vec::new(),
            alerts: Vec::new(),
            totals: BTreeMap::new(),
            aborted: true,
            abort_reason: Some(reason),
            timed_out: false,
        }
    }

    pub fn recording_warnings(&self) -> impl Iterator<Item = &AlertRecordEntry> {
        self.alerts
            .iter()
            .filter(|entry| entry.recording_warning.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Nothing failed; skips do not count as failures
    Succeeded,
    /// Some work failed while some succeeded
    PartiallyFailed,
    /// Something failed and nothing succeeded
    Failed,
    /// Every sub-scan aborted
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub check_type: CheckType,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sections: Vec<SectionReport>,
    pub totals: BTreeMap<NotificationChannel, ChannelTally>,
    pub status: ScanStatus,
}

impl ScanReport {
    pub fn candidates_scanned(&self) -> usize {
        self.sections.iter().map(|s| s.candidates_scanned).sum()
    }

    /// Every outcome, section by section, each in candidate order
    pub fn outcomes(&self) -> impl Iterator<Item = &DispatchOutcome> {
        self.sections.iter().flat_map(|s| s.outcomes.iter())
    }

    pub fn section(&self, category: AlertCategory) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.category == category)
    }

    pub fn aborted_sections(&self) -> impl Iterator<Item = &SectionReport> {
        self.sections.iter().filter(|s| s.aborted)
    }
}
