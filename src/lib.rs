//! # BotBlock
//!
//! Async client that reports a Discord bot's guild count to the
//! [BotBlock](https://botblock.org) API, which forwards it to every bot-list
//! site the bot has a token for.
//!
//! ## Features
//!
//! - **Credential Store**: per-site tokens, shared with a running scheduler
//! - **Bot Sources**: fixed values, a live client or a shard manager
//! - **Typed Failures**: rate limits and per-site failures are separate errors
//! - **Scheduler**: optional periodic posting with start/stop control
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use botblock::{BotBlockClient, BotSource, CredentialStore, PostingConfig, Scheduler, Site};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let credentials = CredentialStore::new();
//!     credentials.set(Site::DiscordBotsGg, "your-token")?;
//!     credentials.set("https://lbots.org", "another-token")?;
//!
//!     let client = BotBlockClient::new()?;
//!     let source = BotSource::fixed(123_456_789_u64, 250)?;
//!
//!     // One manual post; every error reaches the caller.
//!     client.post_guilds(&source, &credentials).await?;
//!
//!     // Or post every 30 minutes in the background.
//!     let scheduler = Scheduler::new(client, credentials, PostingConfig::new().with_source(source));
//!     scheduler.start()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Transport and scheduling settings can be loaded from a JSON file with
//! [`Config::from_file`]. The bot source is always supplied at runtime.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod ratelimit;
pub mod scheduler;
pub mod site;
pub mod source;

// Re-exports for convenience
pub use auth::CredentialStore;
pub use client::{BotBlockClient, CountResponse};
pub use config::{ClientConfig, Config, PostingConfig};
pub use error::{BotBlockError, Result};
pub use payload::Payload;
pub use ratelimit::RateLimit;
pub use scheduler::Scheduler;
pub use site::Site;
pub use source::{BotClient, BotSnapshot, BotSource, ShardInfo, ShardManager};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
