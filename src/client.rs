//! HTTP transport for the BotBlock count endpoint.
//!
//! One call is one round trip: there is no retry here. Rate limiting and
//! per-site failures come back as their own error variants so the caller
//! can decide whether to back off or just log.

use crate::auth::CredentialStore;
use crate::config::ClientConfig;
use crate::error::{BotBlockError, Result};
use crate::payload::Payload;
use crate::ratelimit::RateLimit;
use crate::source::BotSource;
use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Result of a fully successful post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountResponse {
    /// Sites BotBlock reported as updated.
    pub succeeded: Vec<String>,
}

/// Client for `POST /api/count`.
#[derive(Debug, Clone)]
pub struct BotBlockClient {
    client: Client,
    endpoint: String,
}

impl BotBlockClient {
    /// Create a client posting to the default BotBlock endpoint.
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a client from transport settings.
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(BotBlockError::InvalidArgument(
                "endpoint URL cannot be empty".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// URL the client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Read `source`, build the payload and post it.
    pub async fn post_guilds(
        &self,
        source: &BotSource,
        credentials: &CredentialStore,
    ) -> Result<CountResponse> {
        let snapshot = source.snapshot()?;
        let payload = Payload::build(&snapshot, &credentials.snapshot());
        debug!(
            bot_id = snapshot.bot_id(),
            guilds = snapshot.total_guilds(),
            sites = credentials.len(),
            "Posting guild count"
        );
        self.post(&payload).await
    }

    /// Send a payload once.
    pub async fn post(&self, payload: &Payload) -> Result<CountResponse> {
        trace!(endpoint = %self.endpoint, bot_id = payload.bot_id(), "Sending request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::USER_AGENT, payload.bot_id())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let result = parse_response(status, &body)?;
        info!(
            bot_id = payload.bot_id(),
            sites = result.succeeded.len(),
            "Posted guild count to BotBlock"
        );
        Ok(result)
    }
}

/// Interpret a BotBlock response.
pub fn parse_response(status: StatusCode, body: &str) -> Result<CountResponse> {
    if body.trim().is_empty() {
        return Err(BotBlockError::EmptyResponse);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let limit: RateLimit =
            serde_json::from_str(body).map_err(|e| BotBlockError::Transport {
                status: Some(status.as_u16()),
                message: format!("unreadable rate limit response: {e}"),
                source: None,
            })?;
        return Err(BotBlockError::RateLimited(limit));
    }

    if !status.is_success() {
        return Err(BotBlockError::Transport {
            status: Some(status.as_u16()),
            message: format!(
                "API responded with error code {} ({})",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            ),
            source: None,
        });
    }

    let json: Value = serde_json::from_str(body).map_err(|e| BotBlockError::InvalidResponse {
        message: e.to_string(),
    })?;

    let failures = failure_descriptors(json.get("failure"));
    if !failures.is_empty() {
        return Err(BotBlockError::PartialFailure(failures));
    }

    let succeeded = match json.get("success") {
        Some(Value::Object(sites)) => sites.keys().cloned().collect(),
        _ => Vec::new(),
    };

    Ok(CountResponse { succeeded })
}

fn failure_descriptors(failure: Option<&Value>) -> Vec<String> {
    match failure {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) if items.is_empty() => Vec::new(),
        Some(Value::Object(sites)) => sites
            .iter()
            .map(|(site, detail)| match site_error(detail) {
                Some((code, message)) => format!(
                    "Site name: {site}, Error Code: {code}, Error Message: {message}"
                ),
                None => format!("Errors: {site}: {detail}"),
            })
            .collect(),
        Some(other) => vec![format!("Errors: {other}")],
    }
}

/// `[error_code, error_message]`
fn site_error(detail: &Value) -> Option<(i64, &str)> {
    match detail.as_array()?.as_slice() {
        [code, message] => Some((code.as_i64()?, message.as_str()?)),
        _ => None,
    }
}
