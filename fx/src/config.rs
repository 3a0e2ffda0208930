//! Rate service configuration.

use std::time::Duration;

use glasscalc_common::{constants, DurationExt};

use crate::cache::RateCacheConfig;

/// Default Frankfurter-compatible rate source.
pub const DEFAULT_RATE_URL: &str = "https://api.frankfurter.app";

/// Configuration for [`crate::RateCacheService`].
#[derive(Debug, Clone)]
pub struct RateServiceConfig {
    /// Base URL of the rate source.
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Cache configuration.
    pub cache: RateCacheConfig,
}

impl Default for RateServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RATE_URL.to_string(),
            request_timeout: constants::http_request_timeout().as_std(),
            cache: RateCacheConfig::default(),
        }
    }
}

impl RateServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("GLASSCALC_RATE_URL") {
            config.base_url = url;
        }

        if let Ok(ttl) = std::env::var("GLASSCALC_RATE_TTL_SECS") {
            if let Some(ttl) = ttl.parse::<i64>().ok().and_then(ttl_from_secs) {
                config.cache.ttl = ttl;
            }
        }

        if let Ok(timeout) = std::env::var("GLASSCALC_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Set the cache TTL from a number of seconds.
    pub fn set_ttl_secs(&mut self, secs: i64) -> Result<(), String> {
        self.cache.ttl =
            ttl_from_secs(secs).ok_or_else(|| format!("Cache TTL out of range: {secs}s"))?;
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Rate source URL cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("Rate source URL must be http(s): {}", self.base_url));
        }

        if self.cache.ttl <= chrono::Duration::zero() {
            return Err("Cache TTL must be positive".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        Ok(())
    }
}

/// `None` when `secs` does not fit a [`chrono::Duration`].
fn ttl_from_secs(secs: i64) -> Option<chrono::Duration> {
    chrono::Duration::try_seconds(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl, chrono::Duration::minutes(60));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = RateServiceConfig::default();
        config.base_url = "ftp://rates".to_string();
        assert!(config.validate().is_err());

        let mut config = RateServiceConfig::default();
        config.cache.ttl = chrono::Duration::zero();
        assert!(config.validate().is_err());

        let mut config = RateServiceConfig::default();
        config.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ttl_secs_out_of_range() {
        assert_eq!(ttl_from_secs(3600), Some(chrono::Duration::minutes(60)));
        assert_eq!(ttl_from_secs(i64::MAX), None);
        assert_eq!(ttl_from_secs(i64::MAX / 1000 + 1), None);

        let mut config = RateServiceConfig::default();
        assert!(config.set_ttl_secs(i64::MAX).is_err());
        assert_eq!(config.cache.ttl, chrono::Duration::minutes(60));

        assert!(config.set_ttl_secs(90).is_ok());
        assert_eq!(config.cache.ttl, chrono::Duration::seconds(90));
    }
}
