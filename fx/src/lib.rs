//! Glasscalc FX Rate Service
//!
//! Exchange-rate lookups and currency conversion backed by a remote rate
//! source.
//!
//! # Features
//!
//! - Rate tables cached per base currency with a configurable TTL
//! - Single-flight refresh: concurrent callers share one request per base
//! - Failed refreshes never touch the cached table
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use glasscalc_fx::{RateCacheService, RateServiceConfig};
//!
//! let service = Arc::new(RateCacheService::from_config(&RateServiceConfig::from_env())?);
//!
//! let eur = service.convert(100.0, "USD", "EUR").await?;
//! let currencies = service.available_currencies().await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod provider;
pub mod rates;
pub mod service;

pub use cache::{CacheStats, RateCache, RateCacheConfig};
pub use config::{RateServiceConfig, DEFAULT_RATE_URL};
pub use error::{FxError, FxResult};
pub use provider::{HttpRateProvider, RateProvider};
pub use rates::RateTable;
pub use service::{RateCacheService, SharedRateService};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
