//! Turns the unordered outcome set of a scan into a [`ScanReport`].
//!
//! Everything here is pure: no clock reads except the finish timestamps, no I/O.

use crate::dispatcher::{DeliveryStatus, DispatchOutcome};
use crate::models::{AlertCategory, CheckType};
use crate::report::{
    AlertEntryStatus, AlertRecordEntry, ChannelTally, ScanReport, ScanStatus, SectionReport,
};
use chrono::{DateTime, Utc};
use notification_common::NotificationChannel;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// What the aggregator needs to know about a sub-scan besides its outcomes
#[derive(Debug, Clone)]
pub struct SectionMeta {
    pub category: AlertCategory,
    pub window_days: Option<u32>,
    pub started_at: DateTime<Utc>,
    /// Product ids in scanner order
    pub product_ids: Vec<String>,
    pub channels: Vec<NotificationChannel>,
}

pub fn aggregate_section(
    meta: SectionMeta,
    mut outcomes: Vec<DispatchOutcome>,
    mut alerts: Vec<AlertRecordEntry>,
) -> SectionReport {
    let present: HashSet<(usize, NotificationChannel)> = outcomes
        .iter()
        .map(|o| (o.candidate_index, o.channel))
        .collect();

    // A pair without an outcome means its task never resolved
    for (index, product_id) in meta.product_ids.iter().enumerate() {
        for &channel in &meta.channels {
            if !present.contains(&(index, channel)) {
                outcomes.push(
                    DispatchOutcome::new(index, product_id, channel, DeliveryStatus::Failed)
                        .with_error("dispatch task did not complete"),
                );
            }
        }
    }

    outcomes.sort_by_key(|o| (o.candidate_index, o.channel));

    let position: HashMap<&str, usize> = meta
        .product_ids
        .iter()
        .enumerate()
        .rev()
        .map(|(index, id)| (id.as_str(), index))
        .collect();
    alerts.sort_by_key(|entry| {
        position
            .get(entry.product_id.as_str())
            .copied()
            .unwrap_or(usize::MAX)
    });

    let mut totals: BTreeMap<NotificationChannel, ChannelTally> = meta
        .channels
        .iter()
        .map(|&channel| (channel, ChannelTally::default()))
        .collect();
    for outcome in &outcomes {
        totals.entry(outcome.channel).or_default().add(outcome.status);
    }

    let timed_out = outcomes
        .iter()
        .any(|o| o.status == DeliveryStatus::NotAttempted)
        || alerts
            .iter()
            .any(|a| a.status == AlertEntryStatus::NotAttempted);

    SectionReport {
        category: meta.category,
        window_days: meta.window_days,
        started_at: meta.started_at,
        finished_at: Utc::now(),
        candidates_scanned: meta.product_ids.len(),
        outcomes,
        alerts,
        totals,
        aborted: false,
        abort_reason: None,
        timed_out,
    }
}

pub fn aggregate_scan(
    scan_id: Uuid,
    check_type: CheckType,
    started_at: DateTime<Utc>,
    sections: Vec<SectionReport>,
) -> ScanReport {
    let mut totals: BTreeMap<NotificationChannel, ChannelTally> = BTreeMap::new();
    for section in &sections {
        for (channel, tally) in &section.totals {
            totals.entry(*channel).or_default().merge(tally);
        }
    }
    let status = derive_status(&sections);

    ScanReport {
        scan_id,
        check_type,
        started_at,
        finished_at: Utc::now(),
        sections,
        totals,
        status,
    }
}

/// Overall status from the section contents.
///
/// Skips are neither successes nor failures. Recording warnings, failed or
/// unattempted sends and aborted sections all count as failures.
pub fn derive_status(sections: &[SectionReport]) -> ScanStatus {
    if !sections.is_empty() && sections.iter().all(|s| s.aborted) {
        return ScanStatus::Aborted;
    }

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for section in sections {
        if section.aborted {
            failed += 1;
        }
        for outcome in &section.outcomes {
            match outcome.status {
                DeliveryStatus::Sent => succeeded += 1,
                DeliveryStatus::Failed | DeliveryStatus::NotAttempted => failed += 1,
                DeliveryStatus::Skipped => {}
            }
        }
        for alert in &section.alerts {
            match alert.status {
                AlertEntryStatus::Created | AlertEntryStatus::AlreadyExists => succeeded += 1,
                AlertEntryStatus::Failed | AlertEntryStatus::NotAttempted => failed += 1,
            }
        }
    }

    match (succeeded, failed) {
        (_, 0) => ScanStatus::Succeeded,
        (0, _) => ScanStatus::Failed,
        _ => ScanStatus::PartiallyFailed,
    }
}
