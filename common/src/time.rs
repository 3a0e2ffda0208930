//! Time utilities and constants shared by the rate cache.

use chrono::{DateTime, Duration, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// Rate table time-to-live (60 minutes).
    pub fn rate_cache_ttl() -> Duration {
        Duration::minutes(60)
    }

    /// Request timeout applied by the HTTP rate source (15 seconds).
    pub fn http_request_timeout() -> Duration {
        Duration::seconds(15)
    }
}

/// A timestamp, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Age of `timestamp` relative to now. Timestamps in the future have zero age.
pub fn age(timestamp: Timestamp) -> Duration {
    let age = now() - timestamp;
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}

/// Check whether `timestamp` is younger than `ttl`.
pub fn is_within(timestamp: Timestamp, ttl: Duration) -> bool {
    age(timestamp) < ttl
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
