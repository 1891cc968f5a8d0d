//! Per-site authorization tokens.
//!
//! [`CredentialStore`] maps a bot-list hostname to the API token that list
//! issued for the bot. The store is a cheap cloneable handle: every clone
//! sees the same entries, so a running [`Scheduler`](crate::Scheduler)
//! picks up changes on its next tick.

use crate::error::{BotBlockError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Payload fields a site key may not shadow.
pub const RESERVED_KEYS: [&str; 5] = ["server_count", "bot_id", "shard_id", "shard_count", "shards"];

/// Shared map of bot-list site to authorization token.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl CredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token for a site, replacing any previous one.
    ///
    /// A leading `http://` or `https://` is stripped from `site`.
    pub fn set(&self, site: impl AsRef<str>, token: impl Into<String>) -> Result<()> {
        let (site, token) = validate_entry(site.as_ref(), token.into())?;
        self.tokens.write().insert(site, token);
        Ok(())
    }

    /// Replace every entry with `tokens`.
    ///
    /// All entries are validated before anything is swapped in, so a
    /// rejected call leaves the store untouched.
    pub fn bulk_replace<I, K, V>(&self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let replacement = tokens
            .into_iter()
            .map(|(site, token)| validate_entry(site.as_ref(), token.into()))
            .collect::<Result<HashMap<_, _>>>()?;

        if replacement.is_empty() {
            return Err(BotBlockError::InvalidArgument(
                "token map may not be empty".to_string(),
            ));
        }

        *self.tokens.write() = replacement;
        Ok(())
    }

    /// Remove a site, returning its token.
    pub fn remove(&self, site: impl AsRef<str>) -> Option<String> {
        self.tokens.write().remove(normalize_site(site.as_ref()))
    }

    /// The token stored for a site.
    pub fn get(&self, site: impl AsRef<str>) -> Option<String> {
        self.tokens.read().get(normalize_site(site.as_ref())).cloned()
    }

    /// Copy of all entries.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.tokens.read().clone()
    }

    /// Number of sites with a token.
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    /// Whether no tokens are stored.
    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

/// Strip a leading `http://` or `https://`.
pub fn normalize_site(site: &str) -> &str {
    site.strip_prefix("https://")
        .or_else(|| site.strip_prefix("http://"))
        .unwrap_or(site)
}

fn validate_entry(site: &str, token: String) -> Result<(String, String)> {
    let site = normalize_site(site.trim());
    if site.is_empty() {
        return Err(BotBlockError::InvalidArgument(
            "site may not be empty".to_string(),
        ));
    }
    if token.is_empty() {
        return Err(BotBlockError::InvalidArgument(format!(
            "token for '{site}' may not be empty"
        )));
    }
    if RESERVED_KEYS.contains(&site) {
        return Err(BotBlockError::InvalidArgument(format!(
            "'{site}' is a reserved payload field and can't be used as a site"
        )));
    }
    Ok((site.to_string(), token))
}
