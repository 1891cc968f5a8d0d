//! Error types for the BotBlock client.
//!
//! Every failure the crate can surface is a variant of [`BotBlockError`].
//! Remote conditions a caller is expected to react to (rate limiting,
//! per-site failures) get their own variants so they can be matched on
//! instead of parsed out of a message.

use crate::ratelimit::RateLimit;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or posting guild counts.
#[derive(Error, Debug)]
pub enum BotBlockError {
    /// A required argument was empty, missing or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The live bot client has not finished connecting.
    #[error("bot client is not ready: {0}")]
    NotReady(String),

    /// BotBlock answered with HTTP 429.
    #[error("{0}")]
    RateLimited(RateLimit),

    /// The request failed at the network level or returned a non-2xx status.
    #[error("couldn't post guilds to BotBlock ({}): {message}", status_label(.status))]
    Transport {
        /// HTTP status code, if a response was received at all.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
        /// The underlying HTTP client error, if any.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// BotBlock returned no body.
    #[error("received empty body from BotBlock")]
    EmptyResponse,

    /// BotBlock returned a 2xx body that could not be understood.
    #[error("invalid BotBlock response: {message}")]
    InvalidResponse {
        /// Description of what was invalid.
        message: String,
    },

    /// One or more bot lists rejected the update.
    #[error("one or multiple requests to post guild counts failed: {}", .0.join(", "))]
    PartialFailure(Vec<String>),

    /// The scheduler was used in a way its current state does not allow.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Failed to read a configuration file.
    #[error("failed to read config file '{path}': {source}")]
    ConfigRead {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a configuration file.
    #[error("failed to parse config file '{path}': {source}")]
    ConfigParse {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}

impl From<reqwest::Error> for BotBlockError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
            source: Some(error),
        }
    }
}

impl BotBlockError {
    /// The rate limit details, if this is a [`BotBlockError::RateLimited`].
    pub fn rate_limit(&self) -> Option<&RateLimit> {
        match self {
            Self::RateLimited(limit) => Some(limit),
            _ => None,
        }
    }
}

/// Result type alias for BotBlock operations.
pub type Result<T> = std::result::Result<T, BotBlockError>;
