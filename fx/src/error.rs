//! Rate service error types.

use thiserror::Error;

/// Errors surfaced to callers of the rate service.
///
/// `Clone` so a single failed fetch can be reported to every waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FxError {
    /// Transport failure, non-success status or undecodable payload.
    #[error("Network error: {0}")]
    Network(String),

    /// The fetched rate table has no entry for the target currency.
    #[error("Unsupported currency: no {to} rate for {from}")]
    UnsupportedCurrency { from: String, to: String },
}

impl FxError {
    /// Check if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::Network(_))
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
