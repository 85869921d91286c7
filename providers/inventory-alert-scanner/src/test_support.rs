//! In-memory collaborators and fixtures shared by the unit tests

use crate::alert_recorder::AlertRecorder;
use crate::alert_store::{dedup_key, AlertStore, InsertOutcome};
use crate::dispatcher::NotificationDispatcher;
use crate::error::{AlertStoreError, ScanError};
use crate::expiry_scanner::ExpiryScanner;
use crate::models::{Alert, Candidate, Product, Supplier};
use crate::orchestrator::ScanOrchestrator;
use crate::product_source::ProductSource;
use crate::{Result, ScannerConfig};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use notification_common::{ChannelAdapter, DeliveryReceipt, NotificationChannel, ProviderError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn product_expiring_in(id: &str, days: i64, now: DateTime<Utc>) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        sku: format!("SKU-{}", id),
        quantity: 20.0,
        unit: "units".to_string(),
        expires_at: Some(now + ChronoDuration::days(days)),
        reorder_threshold: 5.0,
        location: None,
        supplier_id: None,
    }
}

pub fn low_stock_product(id: &str, quantity: f64, reorder_threshold: f64) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        sku: format!("SKU-{}", id),
        quantity,
        unit: "units".to_string(),
        expires_at: None,
        reorder_threshold,
        location: None,
        supplier_id: None,
    }
}

pub fn supplier(email: Option<&str>, phone: Option<&str>) -> Supplier {
    Supplier {
        id: "s1".to_string(),
        name: "Acme Supply".to_string(),
        email: email.map(str::to_string),
        phone: phone.map(str::to_string),
    }
}

pub fn test_config() -> ScannerConfig {
    ScannerConfig {
        retry_initial_delay_ms: 1,
        retry_max_delay_ms: 5,
        ..ScannerConfig::default()
    }
}

pub fn orchestrator(
    source: FakeProductSource,
    store: impl Into<Arc<MemoryAlertStore>>,
    adapters: Vec<Arc<dyn ChannelAdapter>>,
) -> ScanOrchestrator {
    orchestrator_with_config(source, store, adapters, &test_config())
}

pub fn orchestrator_with_config(
    source: FakeProductSource,
    store: impl Into<Arc<MemoryAlertStore>>,
    adapters: Vec<Arc<dyn ChannelAdapter>>,
    config: &ScannerConfig,
) -> ScanOrchestrator {
    let store: Arc<MemoryAlertStore> = store.into();
    ScanOrchestrator::new(
        ExpiryScanner::new(Arc::new(source)),
        AlertRecorder::new(store),
        NotificationDispatcher::new(adapters, config.retry_config(), config.max_in_flight_sends),
        config,
    )
}

/// Product source returning fixed rows, or failing on demand
pub struct FakeProductSource {
    expiring: Vec<Candidate>,
    low_stock: Vec<Candidate>,
    fail_expiry: bool,
    fail_low_stock: bool,
}

impl FakeProductSource {
    pub fn new(expiring: Vec<Candidate>, low_stock: Vec<Candidate>) -> Self {
        Self {
            expiring,
            low_stock,
            fail_expiry: false,
            fail_low_stock: false,
        }
    }

    pub fn failing_expiry(mut self) -> Self {
        self.fail_expiry = true;
        self
    }

    pub fn failing_low_stock(mut self) -> Self {
        self.fail_low_stock = true;
        self
    }
}

#[async_trait]
impl ProductSource for FakeProductSource {
    async fn query_expiring(&self, _window_days: u32) -> Result<Vec<Candidate>> {
        if self.fail_expiry {
            return Err(ScanError::SourceUnavailable("connection refused".to_string()));
        }
        Ok(self.expiring.clone())
    }

    async fn query_low_stock(&self) -> Result<Vec<Candidate>> {
        if self.fail_low_stock {
            return Err(ScanError::SourceUnavailable("connection refused".to_string()));
        }
        Ok(self.low_stock.clone())
    }
}

/// Alert store keeping rows in memory with the same per-day uniqueness rule
#[derive(Default)]
pub struct MemoryAlertStore {
    keys: Mutex<HashSet<String>>,
    alerts: Mutex<Vec<Alert>>,
    failing: HashSet<String>,
}

impl MemoryAlertStore {
    pub fn failing_for(mut self, product_id: &str) -> Self {
        self.failing.insert(product_id.to_string());
        self
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn insert_if_absent(
        &self,
        alert: &Alert,
        day: NaiveDate,
    ) -> std::result::Result<InsertOutcome, AlertStoreError> {
        if self.failing.contains(&alert.product_id) {
            return Err(AlertStoreError::Pool("connection reset".to_string()));
        }
        let key = dedup_key(alert.category, &alert.product_id, day);
        if !self.keys.lock().unwrap().insert(key) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(InsertOutcome::Created)
    }
}

/// Channel adapter answering from a per-target script.
///
/// Each call pops the next scripted result for its target; once the script is
/// empty every call succeeds.
pub struct ScriptedAdapter {
    channel: NotificationChannel,
    configured: bool,
    scripts: Mutex<HashMap<String, VecDeque<std::result::Result<(), ProviderError>>>>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(channel: NotificationChannel) -> Self {
        Self {
            channel,
            configured: true,
            scripts: Mutex::new(HashMap::new()),
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn with_script(
        self,
        target: &str,
        results: Vec<std::result::Result<(), ProviderError>>,
    ) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(target.to_string(), results.into());
        self
    }

    pub fn with_delay(mut self, target: &str, delay: Duration) -> Self {
        self.delays.insert(target.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelAdapter for ScriptedAdapter {
    fn channel(&self) -> NotificationChannel {
        self.channel
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(
        &self,
        target: &str,
        _subject: &str,
        _body: &str,
    ) -> std::result::Result<DeliveryReceipt, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(target) {
            tokio::time::sleep(*delay).await;
        }
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(target)
            .and_then(VecDeque::pop_front);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match scripted {
            Some(Err(e)) => Err(e),
            _ => Ok(DeliveryReceipt::new(
                self.channel,
                Some(format!("{}-{}", self.channel.as_str(), target)),
            )),
        }
    }
}
