//! Rate table model.

use std::collections::HashMap;

use chrono::Duration;
use glasscalc_common::{is_within, now, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// Rates for one base currency, as fetched from the rate source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// ISO code of the base currency.
    pub base: String,
    /// Publication date reported by the source.
    pub date: String,
    /// Units of each quote currency per one unit of `base`.
    pub rates: HashMap<String, f64>,
    /// When this table was fetched.
    pub fetched_at: Timestamp,
}

impl RateTable {
    pub fn new(base: impl Into<String>, date: impl Into<String>, rates: HashMap<String, f64>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            date: date.into(),
            rates,
            fetched_at: now(),
        }
    }

    /// Rate for `code`, if present.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Fresh iff younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        is_within(self.fetched_at, ttl)
    }

    /// Convert `amount` of the base currency into `to`.
    pub fn convert(&self, amount: f64, to: &str) -> FxResult<f64> {
        self.rate(to)
            .map(|rate| amount * rate)
            .ok_or_else(|| FxError::UnsupportedCurrency {
                from: self.base.clone(),
                to: to.to_string(),
            })
    }
}
