//! Rate table cache with TTL and single-flight refresh.
//!
//! One mutex guards both the cached tables and the in-flight fetch
//! registry, so "is there a fresh entry", "is a fetch running" and "start a
//! fetch" are decided in one critical section. The fetch itself runs on its
//! own task outside the lock; when it finishes it stores the table (on
//! success) and clears its in-flight marker under the lock, and every waiter
//! receives the same outcome.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use futures::future::{BoxFuture, FutureExt, Shared};
use glasscalc_common::{constants, now};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{FxError, FxResult};
use crate::rates::RateTable;

type SharedFetch = Shared<BoxFuture<'static, FxResult<Arc<RateTable>>>>;

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Maximum age of a table before it is refetched.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::rate_cache_ttl(),
        }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Arc<RateTable>>,
    in_flight: HashMap<String, SharedFetch>,
}

/// Thread-safe rate cache keyed by base currency.
pub struct RateCache {
    state: Arc<Mutex<CacheState>>,
    fetches: Arc<AtomicU64>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            fetches: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    pub fn config(&self) -> &RateCacheConfig {
        &self.config
    }

    /// Return the fresh table for `base`, or fetch it.
    ///
    /// `fetch` is only invoked when no fresh entry exists and no fetch for
    /// `base` is already running; otherwise the caller joins the running one.
    /// Must be called within a Tokio runtime.
    pub async fn get_or_fetch<F, Fut>(&self, base: &str, fetch: F) -> FxResult<Arc<RateTable>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FxResult<RateTable>> + Send + 'static,
    {
        let pending = {
            let mut state = self.state.lock();

            if let Some(entry) = state.entries.get(base) {
                if entry.is_fresh(self.config.ttl) {
                    debug!(base = %base, "Cache hit");
                    return Ok(Arc::clone(entry));
                }
                debug!(base = %base, fetched_at = %entry.fetched_at, "Cache entry stale");
            }

            match state.in_flight.get(base) {
                Some(pending) => {
                    debug!(base = %base, "Joining in-flight fetch");
                    pending.clone()
                }
                None => {
                    debug!(base = %base, "Cache miss, starting fetch");
                    let pending = self.start_fetch(base.to_string(), fetch());
                    state.in_flight.insert(base.to_string(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Cached table for `base`, fresh or not. Never fetches.
    pub fn get(&self, base: &str) -> Option<Arc<RateTable>> {
        self.state.lock().entries.get(base).cloned()
    }

    /// Store a table as-is, keeping its `fetched_at`.
    pub fn insert(&self, table: RateTable) {
        let base = table.base.clone();
        self.state.lock().entries.insert(base, Arc::new(table));
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let fresh = state
            .entries
            .values()
            .filter(|entry| entry.is_fresh(self.config.ttl))
            .count();

        CacheStats {
            total_entries: state.entries.len(),
            fresh_entries: fresh,
            in_flight: state.in_flight.len(),
            fetches_started: self.fetches.load(Ordering::Relaxed),
        }
    }

    /// Spawn `fetch` and wrap its outcome for sharing between waiters.
    ///
    /// Called with the state lock held; the spawned task needs the same lock
    /// to finish, so the marker is always registered before it is removed.
    fn start_fetch<Fut>(&self, base: String, fetch: Fut) -> SharedFetch
    where
        Fut: Future<Output = FxResult<RateTable>> + Send + 'static,
    {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            let outcome = fetch.await.map(|mut table| {
                table.fetched_at = now();
                Arc::new(table)
            });

            let mut state = state.lock();
            state.in_flight.remove(&base);
            match &outcome {
                Ok(table) => {
                    info!(base = %base, rates = table.rates.len(), "Rate table refreshed");
                    state.entries.insert(base, Arc::clone(table));
                }
                Err(e) => {
                    warn!(base = %base, error = %e, "Rate fetch failed, cache left unchanged");
                }
            }
            outcome
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(FxError::Network(format!("rate fetch task failed: {e}"))))
        }
        .boxed()
        .shared()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub in_flight: usize,
    /// Fetches started over the cache's lifetime.
    pub fetches_started: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration as StdDuration;

    fn make_table(base: &str) -> RateTable {
        RateTable::new(base, "2024-05-01", HashMap::from([("EUR".to_string(), 0.92)]))
    }

    fn counted_fetch(
        calls: &Arc<AtomicUsize>,
        base: &'static str,
        delay: StdDuration,
    ) -> impl FnOnce() -> BoxFuture<'static, FxResult<RateTable>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(make_table(base))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = RateCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_fetch("USD", counted_fetch(&calls, "USD", StdDuration::ZERO))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch("USD", counted_fetch(&calls, "USD", StdDuration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = Arc::new(RateCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let fetch = counted_fetch(&calls, "USD", StdDuration::from_millis(50));
            handles.push(tokio::spawn(async move {
                cache.get_or_fetch("USD", fetch).await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().fetches_started, 1);
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[tokio::test]
    async fn test_stale_entry_refetched() {
        let cache = RateCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let mut stale = make_table("USD");
        stale.fetched_at = now() - Duration::minutes(61);
        let stale_at = stale.fetched_at;
        cache.insert(stale);

        let refreshed = cache
            .get_or_fetch("USD", counted_fetch(&calls, "USD", StdDuration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(refreshed.fetched_at > stale_at);
        assert_eq!(cache.get("USD").unwrap().fetched_at, refreshed.fetched_at);
    }

    #[tokio::test]
    async fn test_failure_leaves_stale_entry() {
        let cache = RateCache::new();

        let mut stale = make_table("USD");
        stale.fetched_at = now() - Duration::minutes(90);
        cache.insert(stale.clone());

        let result = cache
            .get_or_fetch("USD", || async { Err(FxError::Network("HTTP 503".to_string())) })
            .await;

        assert_eq!(result, Err(FxError::Network("HTTP 503".to_string())));
        assert_eq!(cache.get("USD").unwrap().as_ref(), &stale);
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiters_share_failure() {
        let cache = Arc::new(RateCache::new());

        let leader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_fetch("GBP", || async {
                        tokio::time::sleep(StdDuration::from_millis(50)).await;
                        Err(FxError::Network("connection reset".to_string()))
                    })
                    .await
            })
        };
        tokio::time::sleep(StdDuration::from_millis(10)).await;

        let follower = cache
            .get_or_fetch("GBP", || async { Ok(make_table("GBP")) })
            .await;

        assert_eq!(follower, Err(FxError::Network("connection reset".to_string())));
        assert_eq!(leader.await.unwrap(), follower);
        assert!(cache.get("GBP").is_none());
    }

    #[tokio::test]
    async fn test_fetch_completes_when_caller_dropped() {
        let cache = RateCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let abandoned = cache.get_or_fetch(
            "EUR",
            counted_fetch(&calls, "EUR", StdDuration::from_millis(20)),
        );
        // Registering happens on first poll; give it one, then drop the caller.
        let _ = tokio::time::timeout(StdDuration::from_millis(1), abandoned).await;

        tokio::time::sleep(StdDuration::from_millis(60)).await;
        assert!(cache.get("EUR").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = RateCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("USD", counted_fetch(&calls, "USD", StdDuration::ZERO))
            .await
            .unwrap();
        cache
            .get_or_fetch("EUR", counted_fetch(&calls, "EUR", StdDuration::ZERO))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            cache.stats(),
            CacheStats {
                total_entries: 2,
                fresh_entries: 2,
                in_flight: 0,
                fetches_started: 2,
            }
        );
    }
}
