use crate::aggregator::{aggregate_scan, aggregate_section, SectionMeta};
use crate::alert_recorder::AlertRecorder;
use crate::dispatcher::{DispatchItem, NotificationDispatcher};
use crate::error::ScanError;
use crate::expiry_scanner::ExpiryScanner;
use crate::message::compose_message;
use crate::models::{AlertCategory, AlertSeverity, Candidate, CheckType, ScanRequest};
use crate::report::{AlertEntryStatus, AlertRecordEntry, ScanReport, SectionReport};
use crate::severity::SeverityPolicy;
use crate::{Result, ScannerConfig};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of one sub-scan, logged as it advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Scanning,
    RecordingAndDispatching,
    Aggregating,
    Done,
    Aborted,
}

/// Runs scan, record, dispatch and aggregation as one operation.
///
/// A failure to obtain candidates aborts only the affected category. Every
/// later failure is captured per product and channel in the report.
pub struct ScanOrchestrator {
    scanner: ExpiryScanner,
    recorder: AlertRecorder,
    dispatcher: NotificationDispatcher,
    policy: SeverityPolicy,
    default_window_days: u32,
    scan_timeout: Duration,
    max_concurrent_records: usize,
}

impl ScanOrchestrator {
    pub fn new(
        scanner: ExpiryScanner,
        recorder: AlertRecorder,
        dispatcher: NotificationDispatcher,
        config: &ScannerConfig,
    ) -> Self {
        Self {
            scanner,
            recorder,
            dispatcher,
            policy: SeverityPolicy::from(config),
            default_window_days: config.default_window_days,
            scan_timeout: config.scan_timeout(),
            max_concurrent_records: config.max_concurrent_records.max(1),
        }
    }

    pub async fn run_scan(&self, request: ScanRequest) -> Result<ScanReport> {
        let window_days = request.window_days.unwrap_or(self.default_window_days);
        if window_days == 0 {
            return Err(ScanError::InvalidWindow(window_days));
        }

        let scan_id = Uuid::new_v4();
        let started_at = Utc::now();
        let deadline = Instant::now() + self.scan_timeout;
        info!(%scan_id, check_type = ?request.check_type, window_days, "starting scan");

        let mut sections = Vec::new();
        for &category in request.check_type.categories() {
            let section_window = (category == AlertCategory::Expiry).then_some(window_days);
            match self
                .run_section(scan_id, category, window_days, deadline)
                .await
            {
                Ok(section) => sections.push(section),
                Err(e) if request.check_type == CheckType::All => {
                    warn!(%scan_id, %category, "sub-scan aborted: {}", e);
                    sections.push(SectionReport::aborted(
                        category,
                        section_window,
                        Utc::now(),
                        e.to_string(),
                    ));
                }
                Err(e) => {
                    warn!(%scan_id, %category, "scan aborted: {}", e);
                    return Err(e);
                }
            }
        }

        let report = aggregate_scan(scan_id, request.check_type, started_at, sections);
        info!(
            %scan_id,
            status = ?report.status,
            candidates = report.candidates_scanned(),
            "scan finished"
        );
        Ok(report)
    }

    /// Run `request` on a fixed interval until the task is dropped
    pub async fn run_loop(&self, interval: Duration, request: ScanRequest) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;

            match self.run_scan(request).await {
                Ok(report) => {
                    for (channel, tally) in &report.totals {
                        info!(
                            scan_id = %report.scan_id,
                            %channel,
                            sent = tally.sent,
                            skipped = tally.skipped,
                            failed = tally.failed,
                            not_attempted = tally.not_attempted,
                            "channel summary"
                        );
                    }
                }
                Err(err) => warn!(
                    retryable = err.is_retryable(),
                    "scheduled scan failed: {}",
                    err
                ),
            }
        }
    }

    async fn run_section(
        &self,
        scan_id: Uuid,
        category: AlertCategory,
        window_days: u32,
        deadline: Instant,
    ) -> Result<SectionReport> {
        let started_at = Utc::now();
        let now = started_at;
        log_phase(scan_id, category, ScanPhase::Scanning);

        let candidates =
            match tokio::time::timeout_at(deadline, self.scanner.scan(window_days, category, now))
                .await
            {
                Ok(Ok(candidates)) => candidates,
                Ok(Err(e)) => {
                    log_phase(scan_id, category, ScanPhase::Aborted);
                    return Err(e);
                }
                Err(_) => {
                    log_phase(scan_id, category, ScanPhase::Aborted);
                    return Err(ScanError::Timeout {
                        category,
                        timeout_ms: self.scan_timeout.as_millis() as u64,
                    });
                }
            };

        log_phase(scan_id, category, ScanPhase::RecordingAndDispatching);
        let severities: Vec<AlertSeverity> = candidates
            .iter()
            .map(|c| self.policy.classify(c, category, now))
            .collect();
        let items: Vec<DispatchItem> = candidates
            .iter()
            .zip(&severities)
            .enumerate()
            .map(|(index, (candidate, &severity))| DispatchItem {
                candidate_index: index,
                candidate: candidate.clone(),
                message: compose_message(candidate, category, severity, now),
            })
            .collect();

        let (alerts, outcomes) = tokio::join!(
            self.record_all(&candidates, &severities, category, now, deadline),
            self.dispatcher.dispatch_all(items, Some(deadline)),
        );

        log_phase(scan_id, category, ScanPhase::Aggregating);
        let meta = SectionMeta {
            category,
            window_days: (category == AlertCategory::Expiry).then_some(window_days),
            started_at,
            product_ids: candidates.iter().map(|c| c.product.id.clone()).collect(),
            channels: self.dispatcher.channels(),
        };
        let section = aggregate_section(meta, outcomes, alerts);

        log_phase(scan_id, category, ScanPhase::Done);
        Ok(section)
    }

    async fn record_all(
        &self,
        candidates: &[Candidate],
        severities: &[AlertSeverity],
        category: AlertCategory,
        now: DateTime<Utc>,
        deadline: Instant,
    ) -> Vec<AlertRecordEntry> {
        stream::iter(candidates.iter().zip(severities.iter().copied()))
            .map(|(candidate, severity)| async move {
                let product_id = candidate.product.id.as_str();
                if Instant::now() >= deadline {
                    return AlertRecordEntry::warning(
                        product_id,
                        AlertEntryStatus::NotAttempted,
                        "scan deadline reached before recording".to_string(),
                    );
                }
                match tokio::time::timeout_at(
                    deadline,
                    self.recorder.record(candidate, category, severity, now),
                )
                .await
                {
                    Ok(Ok(status)) => AlertRecordEntry::recorded(product_id, status),
                    Ok(Err(e)) => AlertRecordEntry::warning(
                        product_id,
                        AlertEntryStatus::Failed,
                        e.to_string(),
                    ),
                    Err(_) => AlertRecordEntry::warning(
                        product_id,
                        AlertEntryStatus::Failed,
                        "alert store did not answer before the scan deadline".to_string(),
                    ),
                }
            })
            .buffered(self.max_concurrent_records)
            .collect::<Vec<_>>()
            .await
    }
}

fn log_phase(scan_id: Uuid, category: AlertCategory, phase: ScanPhase) {
    debug!(%scan_id, %category, ?phase, "scan phase");
}
