//! Rate provider trait and implementations.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{FxError, FxResult};
use crate::rates::RateTable;

/// Source of exchange-rate data.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Latest rates quoted against `base`.
    async fn latest(&self, base: &str) -> FxResult<RateTable>;

    /// Directory of supported currencies, code to display name.
    async fn currencies(&self) -> FxResult<BTreeMap<String, String>>;
}

/// Payload of `GET /latest?from=<CODE>`.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[allow(dead_code)]
    amount: f64,
    base: String,
    date: String,
    rates: HashMap<String, f64>,
}

/// Decode a `/latest` payload.
pub fn decode_latest(body: &str) -> FxResult<RateTable> {
    let response: LatestResponse = serde_json::from_str(body)
        .map_err(|e| FxError::Network(format!("malformed rate payload: {e}")))?;
    Ok(RateTable::new(response.base, response.date, response.rates))
}

/// Decode a `/currencies` payload.
pub fn decode_currencies(body: &str) -> FxResult<BTreeMap<String, String>> {
    serde_json::from_str(body)
        .map_err(|e| FxError::Network(format!("malformed currency payload: {e}")))
}

/// Provider backed by a Frankfurter-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateProvider {
    /// Create a provider for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("glasscalc/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FxError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a provider around an existing client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> FxResult<Url> {
        let raw = format!("{}/{}", self.base_url, path);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| FxError::Network(format!("invalid rate source URL: {e}")))
    }

    async fn get_body(&self, url: Url) -> FxResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FxError::Network(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::Network(format!("{url} returned HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| FxError::Network(format!("failed to read response from {url}: {e}")))
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    #[instrument(skip(self))]
    async fn latest(&self, base: &str) -> FxResult<RateTable> {
        let url = self.endpoint("latest", &[("from", base)])?;
        let body = self.get_body(url).await?;
        let table = decode_latest(&body)?;
        debug!(base = %table.base, date = %table.date, rates = table.rates.len(), "Fetched rates");
        Ok(table)
    }

    #[instrument(skip(self))]
    async fn currencies(&self) -> FxResult<BTreeMap<String, String>> {
        let url = self.endpoint("currencies", &[])?;
        let body = self.get_body(url).await?;
        decode_currencies(&body)
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    tables: dashmap::DashMap<String, HashMap<String, f64>>,
    currencies: dashmap::DashMap<String, String>,
    latency: parking_lot::Mutex<Duration>,
    failing: std::sync::atomic::AtomicBool,
    latest_calls: std::sync::atomic::AtomicUsize,
    currency_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            currencies: dashmap::DashMap::new(),
            latency: parking_lot::Mutex::new(Duration::ZERO),
            failing: std::sync::atomic::AtomicBool::new(false),
            latest_calls: std::sync::atomic::AtomicUsize::new(0),
            currency_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set the rate from `base` to `quote`.
    pub fn set_rate(&self, base: &str, quote: &str, rate: f64) {
        self.tables
            .entry(base.to_string())
            .or_default()
            .insert(quote.to_string(), rate);
    }

    /// Add a currency to the directory.
    pub fn add_currency(&self, code: &str, name: &str) {
        self.currencies.insert(code.to_string(), name.to_string());
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Make every request fail with a network error.
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of `latest` requests served.
    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Number of `currencies` requests served.
    pub fn currency_calls(&self) -> usize {
        self.currency_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    async fn respond(&self) -> FxResult<()> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(FxError::Network("mock provider unavailable".to_string()));
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn latest(&self, base: &str) -> FxResult<RateTable> {
        self.latest_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.respond().await?;

        let rates = self
            .tables
            .get(base)
            .map(|r| r.clone())
            .ok_or_else(|| FxError::Network(format!("HTTP 404 for base {base}")))?;
        Ok(RateTable::new(base, "2024-05-01", rates))
    }

    async fn currencies(&self) -> FxResult<BTreeMap<String, String>> {
        self.currency_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.respond().await?;

        Ok(self
            .currencies
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect())
    }
}
