//! Rate limit details returned by BotBlock on HTTP 429.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Body of a 429 response from BotBlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// IP address that got rate limited.
    #[serde(rename = "ratelimit_ip")]
    pub ip: String,

    /// API route that got rate limited.
    #[serde(rename = "ratelimit_route")]
    pub route: String,

    /// Bot ID that got rate limited.
    #[serde(rename = "ratelimit_bot_id")]
    pub bot_id: String,

    /// Seconds to wait before posting again.
    #[serde(rename = "retry_after")]
    pub retry_after_seconds: u64,

    /// Unix timestamp (seconds) at which the limit resets.
    #[serde(rename = "ratelimit_reset")]
    pub reset_epoch_seconds: i64,
}

impl RateLimit {
    /// How long to wait before posting again.
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_seconds)
    }

    /// When the limit resets, if the timestamp is representable.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset_epoch_seconds, 0)
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bot {} (IP: {}) got rate limited on route {}, retry in {} seconds",
            self.bot_id, self.ip, self.route, self.retry_after_seconds
        )
    }
}
