//! Product queries against the inventory service

use crate::error::ScanError;
use crate::models::Candidate;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// Read-only view of the inventory store used by the scanner.
///
/// Each returned candidate carries its supplier record (or none) so that
/// dispatch needs no further lookups.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn query_expiring(&self, window_days: u32) -> Result<Vec<Candidate>>;
    async fn query_low_stock(&self) -> Result<Vec<Candidate>>;
}

/// Inventory REST API client
pub struct HttpProductSource {
    http_client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpProductSource {
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Candidate>> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http_client.get(&url).query(query);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Inventory API request to {} failed: {}", url, e);
            ScanError::SourceUnavailable(format!("request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Inventory API returned {} for {}: {}", status, url, body);
            return Err(ScanError::SourceUnavailable(format!(
                "{} returned status {}",
                url, status
            )));
        }

        let candidates: Vec<Candidate> = response.json().await.map_err(|e| {
            ScanError::SourceUnavailable(format!("invalid product payload from {}: {}", url, e))
        })?;

        debug!("Inventory API returned {} products for {}", candidates.len(), path);
        Ok(candidates)
    }
}

#[async_trait]
impl ProductSource for HttpProductSource {
    async fn query_expiring(&self, window_days: u32) -> Result<Vec<Candidate>> {
        self.fetch(
            "/products/expiring",
            &[("window_days", window_days.to_string())],
        )
        .await
    }

    async fn query_low_stock(&self) -> Result<Vec<Candidate>> {
        self.fetch("/products/low-stock", &[]).await
    }
}
