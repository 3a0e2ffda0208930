//! Rate cache service: cached rate lookups and conversions.

use std::sync::Arc;

use glasscalc_common::Currency;
use tracing::{debug, info, instrument};

use crate::cache::{CacheStats, RateCache, RateCacheConfig};
use crate::config::RateServiceConfig;
use crate::error::FxResult;
use crate::provider::{HttpRateProvider, RateProvider};
use crate::rates::RateTable;

/// Serves rate tables and conversions from a TTL cache.
///
/// Meant to be created once per process and handed to callers as a
/// [`SharedRateService`].
pub struct RateCacheService {
    provider: Arc<dyn RateProvider>,
    cache: RateCache,
}

impl RateCacheService {
    /// Create a service over `provider`.
    pub fn new(provider: Arc<dyn RateProvider>, config: RateCacheConfig) -> Self {
        Self {
            provider,
            cache: RateCache::with_config(config),
        }
    }

    /// Create a service backed by the HTTP rate source in `config`.
    pub fn from_config(config: &RateServiceConfig) -> FxResult<Self> {
        let provider = HttpRateProvider::new(config.base_url.clone(), config.request_timeout)?;
        Ok(Self::new(Arc::new(provider), config.cache.clone()))
    }

    /// Rates for `base`, from cache when fresh.
    ///
    /// Concurrent callers for the same stale or missing base share a single
    /// request. A failed request leaves any previous table in place.
    #[instrument(skip(self))]
    pub async fn fetch_rates(&self, base: &str) -> FxResult<Arc<RateTable>> {
        let base = normalize_code(base);
        let provider = Arc::clone(&self.provider);
        let key = base.clone();

        self.cache
            .get_or_fetch(&key, move || async move { provider.latest(&base).await })
            .await
    }

    /// Convert `amount` from one currency to another.
    #[instrument(skip(self))]
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> FxResult<f64> {
        let from = normalize_code(from);
        let to = normalize_code(to);
        if from == to {
            debug!("Same-currency conversion");
            return Ok(amount);
        }

        let table = self.fetch_rates(&from).await?;
        let converted = table.convert(amount, &to)?;

        info!(
            from = %from,
            to = %to,
            rate = table.rate(&to).unwrap_or_default(),
            result = converted,
            "Conversion completed"
        );

        Ok(converted)
    }

    /// Currency directory from the rate source, sorted by code.
    #[instrument(skip(self))]
    pub async fn available_currencies(&self) -> FxResult<Vec<Currency>> {
        let directory = self.provider.currencies().await?;

        let mut currencies: Vec<Currency> = directory
            .into_iter()
            .map(|(code, name)| Currency::new(code, name))
            .collect();
        currencies.sort();

        debug!(count = currencies.len(), "Fetched currency directory");
        Ok(currencies)
    }

    /// Cached table for `base` without any I/O, fresh or not.
    pub fn cached(&self, base: &str) -> Option<Arc<RateTable>> {
        self.cache.get(&normalize_code(base))
    }

    /// Seed the cache with a table, e.g. one restored by the caller.
    pub fn prime(&self, table: RateTable) {
        self.cache.insert(table);
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

/// Shared rate service handle.
pub type SharedRateService = Arc<RateCacheService>;

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use crate::provider::MockRateProvider;
    use chrono::Duration;
    use glasscalc_common::now;
    use std::collections::HashMap;
    use std::time::Duration as StdDuration;
    use tokio_test::{assert_err, assert_ok};

    fn setup() -> (Arc<MockRateProvider>, RateCacheService) {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_rate("USD", "EUR", 0.92);
        provider.set_rate("USD", "GBP", 0.8);
        provider.set_rate("EUR", "USD", 1.087);
        provider.add_currency("USD", "United States Dollar");
        provider.add_currency("EUR", "Euro");
        provider.add_currency("GBP", "British Pound");

        let service = RateCacheService::new(provider.clone(), RateCacheConfig::default());
        (provider, service)
    }

    #[tokio::test]
    async fn test_convert() {
        let (_, service) = setup();

        let eur = service.convert(100.0, "USD", "EUR").await.unwrap();
        assert_eq!(eur, 92.0);
    }

    #[tokio::test]
    async fn test_same_currency_no_fetch() {
        let (provider, service) = setup();

        let amount = service.convert(100.0, "USD", "usd").await.unwrap();

        assert_eq!(amount, 100.0);
        assert_eq!(provider.latest_calls(), 0);
        assert!(service.cached("USD").is_none());
    }

    #[tokio::test]
    async fn test_conversions_within_ttl_share_fetch() {
        let (provider, service) = setup();

        assert_ok!(service.convert(10.0, "USD", "EUR").await);
        assert_ok!(service.convert(10.0, "USD", "GBP").await);

        assert_eq!(provider.latest_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_conversions_single_flight() {
        let (provider, service) = setup();
        provider.set_latency(StdDuration::from_millis(50));
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for i in 0..10 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let to = if i % 2 == 0 { "EUR" } else { "GBP" };
                service.convert(1.0, "USD", to).await
            }));
        }
        for handle in handles {
            assert_ok!(handle.await.unwrap());
        }

        assert_eq!(provider.latest_calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_triggers_one_fetch() {
        let (provider, service) = setup();

        let mut stale = RateTable::new("USD", "2024-04-01", HashMap::from([("EUR".to_string(), 0.5)]));
        stale.fetched_at = now() - Duration::minutes(61);
        let stale_at = stale.fetched_at;
        service.prime(stale);

        let eur = service.convert(100.0, "USD", "EUR").await.unwrap();
        assert_eq!(eur, 92.0);
        assert_eq!(provider.latest_calls(), 1);
        assert!(service.cached("USD").unwrap().fetched_at > stale_at);

        assert_ok!(service.convert(100.0, "USD", "EUR").await);
        assert_eq!(provider.latest_calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_primed_entry_no_fetch() {
        let (provider, service) = setup();
        service.prime(RateTable::new(
            "USD",
            "2024-05-01",
            HashMap::from([("EUR".to_string(), 0.5)]),
        ));

        assert_eq!(service.convert(10.0, "USD", "EUR").await, Ok(5.0));
        assert_eq!(provider.latest_calls(), 0);
    }

    #[tokio::test]
    async fn test_short_ttl_expires() {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_rate("USD", "EUR", 0.92);
        let service = RateCacheService::new(
            provider.clone(),
            RateCacheConfig {
                ttl: Duration::milliseconds(50),
            },
        );

        assert_ok!(service.fetch_rates("USD").await);
        tokio::time::sleep(StdDuration::from_millis(60)).await;
        assert_ok!(service.fetch_rates("USD").await);

        assert_eq!(provider.latest_calls(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_target() {
        let (_, service) = setup();

        let first = service.fetch_rates("USD").await.unwrap();
        let err = assert_err!(service.convert(1.0, "USD", "XYZ").await);

        assert_eq!(
            err,
            FxError::UnsupportedCurrency {
                from: "USD".to_string(),
                to: "XYZ".to_string(),
            }
        );
        assert!(!err.is_retryable());
        let cached = service.cached("USD").unwrap();
        assert!(Arc::ptr_eq(&first, &cached));
    }

    #[tokio::test]
    async fn test_network_error_keeps_previous_table() {
        let (provider, service) = setup();

        let mut stale = RateTable::new("USD", "2024-04-01", HashMap::from([("EUR".to_string(), 0.5)]));
        stale.fetched_at = now() - Duration::minutes(120);
        service.prime(stale.clone());
        provider.set_failing(true);

        let err = assert_err!(service.convert(1.0, "USD", "EUR").await);
        assert!(matches!(err, FxError::Network(_)));
        assert_eq!(service.cached("USD").unwrap().as_ref(), &stale);

        // No automatic retry; the next call tries again.
        provider.set_failing(false);
        assert_eq!(service.convert(1.0, "USD", "EUR").await, Ok(0.92));
        assert_eq!(provider.latest_calls(), 2);
    }

    #[tokio::test]
    async fn test_available_currencies_sorted() {
        let (provider, service) = setup();

        let currencies = service.available_currencies().await.unwrap();
        let codes: Vec<&str> = currencies.iter().map(|c| c.code()).collect();

        assert_eq!(codes, vec!["EUR", "GBP", "USD"]);
        assert_eq!(currencies[1].name(), "British Pound");

        assert_ok!(service.available_currencies().await);
        assert_eq!(provider.currency_calls(), 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let (_, service) = setup();

        assert_ok!(service.fetch_rates("usd").await);
        assert_ok!(service.fetch_rates("EUR").await);

        let stats = service.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.fresh_entries, 2);
        assert_eq!(stats.fetches_started, 2);
        assert_eq!(service.provider_name(), "test");
    }
}
