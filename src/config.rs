//! Configuration for the BotBlock client and the posting scheduler.
//!
//! [`Config`] can be loaded from a JSON file with sensible defaults;
//! [`PostingConfig`] adds the bot source, which only exists at runtime.

use crate::error::{BotBlockError, Result};
use crate::source::BotSource;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// BotBlock's guild count endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://botblock.org/api/count";

/// Default minutes between scheduled posts.
pub const DEFAULT_UPDATE_INTERVAL: u32 = 30;

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// URL the guild count is posted to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout.
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_update_interval() -> u32 {
    DEFAULT_UPDATE_INTERVAL
}

/// Full configuration as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transport settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Minutes between scheduled posts.
    #[serde(default = "default_update_interval")]
    pub update_interval: u32,

    /// Start posting as soon as the scheduler is launched.
    #[serde(default)]
    pub auto_post: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            update_interval: default_update_interval(),
            auto_post: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BotBlockError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self =
            serde_json::from_str(&content).map_err(|e| BotBlockError::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.client.endpoint.trim().is_empty() {
            return Err(BotBlockError::InvalidArgument(
                "endpoint URL cannot be empty".to_string(),
            ));
        }
        if self.client.timeout.is_zero() {
            return Err(BotBlockError::InvalidArgument(
                "timeout must be greater than 0".to_string(),
            ));
        }
        validate_interval(self.update_interval)
    }

    /// Posting settings without a bot source.
    pub fn posting(&self) -> Result<PostingConfig> {
        let mut posting = PostingConfig::new();
        posting.set_update_interval(self.update_interval)?;
        posting.auto_post = self.auto_post;
        Ok(posting)
    }
}

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct PostingConfig {
    update_interval: u32,
    /// Start the scheduler as soon as it is launched.
    pub auto_post: bool,
    /// Where guild counts are read from.
    pub source: Option<BotSource>,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PostingConfig {
    /// 30 minute interval, no auto post, no source.
    pub fn new() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            auto_post: false,
            source: None,
        }
    }

    /// Set the bot source.
    #[must_use]
    pub fn with_source(mut self, source: BotSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Enable or disable auto posting.
    #[must_use]
    pub fn with_auto_post(mut self, auto_post: bool) -> Self {
        self.auto_post = auto_post;
        self
    }

    /// Set the interval in minutes; must be at least 1.
    pub fn set_update_interval(&mut self, minutes: u32) -> Result<()> {
        validate_interval(minutes)?;
        self.update_interval = minutes;
        Ok(())
    }

    /// Minutes between scheduled posts.
    pub fn update_interval(&self) -> u32 {
        self.update_interval
    }
}

pub(crate) fn validate_interval(minutes: u32) -> Result<()> {
    if minutes < 1 {
        return Err(BotBlockError::InvalidArgument(
            "update interval can't be lower than 1 minute".to_string(),
        ));
    }
    Ok(())
}

/// Serde adapter for durations written as `"30s"`, `"500ms"` or plain seconds.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // "ms" has to be checked before "s"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        }
    }
}
