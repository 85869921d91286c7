//! Fan-out of notifications over the configured channel adapters.
//!
//! Every (candidate, channel) pair becomes its own task. Tasks share one
//! semaphore that bounds the number of sends in flight, and `dispatch_all`
//! only returns once every spawned task has resolved.

use crate::message::NotificationMessage;
use crate::models::Candidate;
use chrono::{DateTime, Utc};
use notification_common::{
    retry_with_backoff, ChannelAdapter, NotificationChannel, ProviderError, RetryConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Skipped,
    Failed,
    NotAttempted,
}

/// Result of one (product, channel) pair in a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Position of the candidate in scanner order
    pub candidate_index: usize,
    pub product_id: String,
    pub channel: NotificationChannel,
    pub target: Option<String>,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub retry_count: u32,
    pub message_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DispatchOutcome {
    pub fn new(
        candidate_index: usize,
        product_id: &str,
        channel: NotificationChannel,
        status: DeliveryStatus,
    ) -> Self {
        Self {
            candidate_index,
            product_id: product_id.to_string(),
            channel,
            target: None,
            status,
            error: None,
            retry_count: 0,
            message_id: None,
            timestamp: Utc::now(),
        }
    }

    fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// One candidate ready to be sent, with its pre-built message
#[derive(Debug, Clone)]
pub struct DispatchItem {
    pub candidate_index: usize,
    pub candidate: Candidate,
    pub message: NotificationMessage,
}

pub struct NotificationDispatcher {
    adapters: Vec<Arc<dyn ChannelAdapter>>,
    retry: RetryConfig,
    semaphore: Arc<Semaphore>,
}

impl NotificationDispatcher {
    pub fn new(
        adapters: Vec<Arc<dyn ChannelAdapter>>,
        retry: RetryConfig,
        max_in_flight: usize,
    ) -> Self {
        Self {
            adapters,
            retry,
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.adapters.iter().map(|a| a.channel()).collect()
    }

    /// Send every item over every adapter.
    ///
    /// Returns one outcome per (item, adapter) pair in completion order. A
    /// task that panics is logged and leaves its pair missing; the aggregator
    /// fills such gaps.
    pub async fn dispatch_all(
        &self,
        items: Vec<DispatchItem>,
        deadline: Option<Instant>,
    ) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(items.len() * self.adapters.len());
        let mut tasks = JoinSet::new();

        for item in items {
            let item = Arc::new(item);
            for adapter in &self.adapters {
                let channel = adapter.channel();
                let product_id = &item.candidate.product.id;

                let Some(target) = item.candidate.contact_for(channel) else {
                    debug!(%product_id, %channel, "no contact for channel, skipping");
                    outcomes.push(
                        DispatchOutcome::new(
                            item.candidate_index,
                            product_id,
                            channel,
                            DeliveryStatus::Skipped,
                        )
                        .with_error(format!("supplier has no {} contact", channel)),
                    );
                    continue;
                };

                if !adapter.is_configured() {
                    debug!(%product_id, %channel, "channel not configured, skipping");
                    outcomes.push(
                        DispatchOutcome::new(
                            item.candidate_index,
                            product_id,
                            channel,
                            DeliveryStatus::Skipped,
                        )
                        .with_target(target)
                        .with_error(format!("{} channel is not configured", channel)),
                    );
                    continue;
                }

                tasks.spawn(send_one(
                    adapter.clone(),
                    self.semaphore.clone(),
                    self.retry.clone(),
                    item.clone(),
                    target.to_string(),
                    deadline,
                ));
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("dispatch task did not complete: {}", e),
            }
        }

        outcomes
    }
}

async fn send_one(
    adapter: Arc<dyn ChannelAdapter>,
    semaphore: Arc<Semaphore>,
    retry: RetryConfig,
    item: Arc<DispatchItem>,
    target: String,
    deadline: Option<Instant>,
) -> DispatchOutcome {
    let channel = adapter.channel();
    let product_id = item.candidate.product.id.as_str();
    let outcome = |status| {
        DispatchOutcome::new(item.candidate_index, product_id, channel, status)
            .with_target(target.as_str())
    };

    let acquired = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, semaphore.acquire_owned()).await
        {
            Ok(acquired) if Instant::now() < deadline => acquired,
            _ => {
                debug!(%product_id, %channel, "deadline reached before send");
                return outcome(DeliveryStatus::NotAttempted)
                    .with_error("scan deadline reached before send started");
            }
        },
        None => semaphore.acquire_owned().await,
    };
    let _permit = match acquired {
        Ok(permit) => permit,
        Err(_) => {
            return outcome(DeliveryStatus::NotAttempted).with_error("dispatcher is shut down")
        }
    };

    let message = &item.message;
    let sent = retry_with_backoff(&retry, deadline, |attempt| {
        debug!(%product_id, %channel, attempt, "sending notification");
        adapter.send(&target, &message.subject, &message.body)
    })
    .await;
    let retry_count = sent.retries();

    match sent.result {
        Ok(receipt) => {
            info!(%product_id, %channel, retry_count, "notification sent");
            let mut sent = outcome(DeliveryStatus::Sent);
            sent.retry_count = retry_count;
            sent.message_id = receipt.message_id;
            sent
        }
        Err(e @ ProviderError::ChannelUnconfigured { .. }) => {
            outcome(DeliveryStatus::Skipped).with_error(e.to_string())
        }
        Err(e) => {
            warn!(
                %product_id,
                %channel,
                error_code = e.error_code(),
                retry_count,
                "notification failed: {}",
                e
            );
            let mut failed = outcome(DeliveryStatus::Failed).with_error(e.to_string());
            failed.retry_count = retry_count;
            failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product_expiring_in, supplier, ScriptedAdapter};
    use std::time::Duration;

    const EMAIL: &str = "buyer@example.com";
    const PHONE: &str = "+15551234567";

    fn fast_retry() -> RetryConfig {
        RetryConfig::new(3, 1, 5).without_jitter()
    }

    fn item(index: usize, id: &str, email: Option<&str>, phone: Option<&str>) -> DispatchItem {
        let now = Utc::now();
        DispatchItem {
            candidate_index: index,
            candidate: Candidate::new(
                product_expiring_in(id, 10, now),
                Some(supplier(email, phone)),
            ),
            message: NotificationMessage {
                subject: format!("{} expiring", id),
                body: "body".to_string(),
            },
        }
    }

    fn find(
        outcomes: &[DispatchOutcome],
        id: &str,
        channel: NotificationChannel,
    ) -> DispatchOutcome {
        outcomes
            .iter()
            .find(|o| o.product_id == id && o.channel == channel)
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_contact_is_skipped() {
        let email = Arc::new(ScriptedAdapter::new(NotificationChannel::Email));
        let sms = Arc::new(ScriptedAdapter::new(NotificationChannel::Sms));
        let dispatcher =
            NotificationDispatcher::new(vec![email.clone(), sms.clone()], fast_retry(), 4);

        let outcomes = dispatcher
            .dispatch_all(vec![item(0, "p1", Some(EMAIL), None)], None)
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            find(&outcomes, "p1", NotificationChannel::Email).status,
            DeliveryStatus::Sent
        );
        let skipped = find(&outcomes, "p1", NotificationChannel::Sms);
        assert_eq!(skipped.status, DeliveryStatus::Skipped);
        assert_eq!(skipped.target, None);
        assert_eq!(sms.calls(), 0);
    }

    #[tokio::test]
    async fn test_supplier_absent_skips_every_channel() {
        let email = Arc::new(ScriptedAdapter::new(NotificationChannel::Email));
        let dispatcher = NotificationDispatcher::new(vec![email.clone()], fast_retry(), 4);
        let mut no_supplier = item(0, "p1", None, None);
        no_supplier.candidate.supplier = None;

        let outcomes = dispatcher.dispatch_all(vec![no_supplier], None).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, DeliveryStatus::Skipped);
        assert_eq!(email.calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_errors_then_success_records_retry_count() {
        let email = Arc::new(ScriptedAdapter::new(NotificationChannel::Email).with_script(
            EMAIL,
            vec![
                Err(ProviderError::NetworkTimeout),
                Err(ProviderError::ServiceUnavailable { status: 503 }),
            ],
        ));
        let dispatcher = NotificationDispatcher::new(vec![email.clone()], fast_retry(), 4);

        let outcomes = dispatcher
            .dispatch_all(vec![item(0, "p1", Some(EMAIL), None)], None)
            .await;

        assert_eq!(outcomes[0].status, DeliveryStatus::Sent);
        assert_eq!(outcomes[0].retry_count, 2);
        assert!(outcomes[0].is_success());
        assert_eq!(email.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_only_that_pair() {
        let email = Arc::new(ScriptedAdapter::new(NotificationChannel::Email).with_script(
            EMAIL,
            vec![
                Err(ProviderError::NetworkError("reset".to_string())),
                Err(ProviderError::NetworkError("reset".to_string())),
                Err(ProviderError::NetworkError("reset".to_string())),
            ],
        ));
        let sms = Arc::new(ScriptedAdapter::new(NotificationChannel::Sms));
        let dispatcher =
            NotificationDispatcher::new(vec![email.clone(), sms.clone()], fast_retry(), 4);

        let outcomes = dispatcher
            .dispatch_all(vec![item(0, "p1", Some(EMAIL), Some(PHONE))], None)
            .await;

        let failed = find(&outcomes, "p1", NotificationChannel::Email);
        assert_eq!(failed.status, DeliveryStatus::Failed);
        assert_eq!(failed.retry_count, 2);
        assert!(failed.error.unwrap().contains("reset"));
        assert_eq!(
            find(&outcomes, "p1", NotificationChannel::Sms).status,
            DeliveryStatus::Sent
        );
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let email = Arc::new(ScriptedAdapter::new(NotificationChannel::Email).with_script(
            EMAIL,
            vec![Err(ProviderError::Rejected {
                status: 422,
                message: "bad sender".to_string(),
            })],
        ));
        let dispatcher = NotificationDispatcher::new(vec![email.clone()], fast_retry(), 4);

        let outcomes = dispatcher
            .dispatch_all(vec![item(0, "p1", Some(EMAIL), None)], None)
            .await;

        assert_eq!(outcomes[0].status, DeliveryStatus::Failed);
        assert_eq!(outcomes[0].retry_count, 0);
        assert_eq!(email.calls(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_email_does_not_touch_sms() {
        let email = Arc::new(ScriptedAdapter::new(NotificationChannel::Email).unconfigured());
        let sms = Arc::new(ScriptedAdapter::new(NotificationChannel::Sms));
        let dispatcher =
            NotificationDispatcher::new(vec![email.clone(), sms.clone()], fast_retry(), 4);

        let items = (0..5)
            .map(|i| item(i, &format!("p{}", i), Some(EMAIL), Some(PHONE)))
            .collect();
        let outcomes = dispatcher.dispatch_all(items, None).await;

        assert_eq!(outcomes.len(), 10);
        for outcome in &outcomes {
            match outcome.channel {
                NotificationChannel::Email => assert_eq!(outcome.status, DeliveryStatus::Skipped),
                NotificationChannel::Sms => assert_eq!(outcome.status, DeliveryStatus::Sent),
            }
        }
        assert_eq!(email.calls(), 0);
        assert_eq!(sms.calls(), 5);
    }

    #[tokio::test]
    async fn test_in_flight_sends_are_bounded() {
        let email = Arc::new(
            ScriptedAdapter::new(NotificationChannel::Email)
                .with_delay(EMAIL, Duration::from_millis(20)),
        );
        let dispatcher = NotificationDispatcher::new(vec![email.clone()], fast_retry(), 2);

        let items = (0..6)
            .map(|i| item(i, &format!("p{}", i), Some(EMAIL), None))
            .collect();
        let outcomes = dispatcher.dispatch_all(items, None).await;

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(DispatchOutcome::is_success));
        assert!(email.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_expired_deadline_marks_not_attempted() {
        let email = Arc::new(ScriptedAdapter::new(NotificationChannel::Email));
        let dispatcher = NotificationDispatcher::new(vec![email.clone()], fast_retry(), 4);

        let outcomes = dispatcher
            .dispatch_all(
                vec![
                    item(0, "p0", Some(EMAIL), None),
                    item(1, "p1", None, None),
                ],
                Some(Instant::now()),
            )
            .await;

        assert_eq!(
            find(&outcomes, "p0", NotificationChannel::Email).status,
            DeliveryStatus::NotAttempted
        );
        assert_eq!(
            find(&outcomes, "p1", NotificationChannel::Email).status,
            DeliveryStatus::Skipped
        );
        assert_eq!(email.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_send_past_deadline_is_not_attempted() {
        let email = Arc::new(
            ScriptedAdapter::new(NotificationChannel::Email)
                .with_delay(EMAIL, Duration::from_millis(200)),
        );
        let dispatcher = NotificationDispatcher::new(vec![email.clone()], fast_retry(), 1);
        let deadline = Instant::now() + Duration::from_millis(50);

        let outcomes = dispatcher
            .dispatch_all(
                vec![
                    item(0, "p0", Some(EMAIL), None),
                    item(1, "p1", Some(EMAIL), None),
                ],
                Some(deadline),
            )
            .await;

        let statuses: Vec<_> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(outcomes.len(), 2);
        assert!(statuses.contains(&DeliveryStatus::Sent));
        assert!(statuses.contains(&DeliveryStatus::NotAttempted));
        assert_eq!(email.calls(), 1);
    }
}
