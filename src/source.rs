//! Where guild counts come from.
//!
//! A [`BotSource`] is picked once at configuration time and asked for a
//! [`BotSnapshot`] on every post. Live sources read a connected bot through
//! the [`BotClient`] and [`ShardManager`] traits, which the host
//! application implements for whatever Discord library it runs on.

use crate::error::{BotBlockError, Result};
use std::fmt;
use std::sync::Arc;

/// Position of a single shard within its shard group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardInfo {
    /// Zero-based shard index.
    pub shard_id: u32,
    /// Total shards in the group.
    pub shard_count: u32,
}

/// A connected bot client (one process, possibly one shard of many).
pub trait BotClient: Send + Sync {
    /// Number of guilds in the client's cache, `None` until connected.
    fn guild_count(&self) -> Option<u64>;

    /// The bot's own user ID, `None` until connected.
    fn self_id(&self) -> Option<String>;

    /// Shard placement, if this client is one shard of a group.
    fn shard_info(&self) -> Option<ShardInfo> {
        None
    }
}

/// A manager owning every shard of a bot in this process.
pub trait ShardManager: Send + Sync {
    /// Total number of shards the bot runs with.
    fn shard_total(&self) -> u32;

    /// The shard clients, ordered by shard index.
    fn shards(&self) -> Vec<Arc<dyn BotClient>>;
}

/// Guild count data captured at post time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotSnapshot {
    /// A single total, optionally tagged with the posting shard's position.
    Flat {
        /// Bot user ID.
        bot_id: String,
        /// Guild count.
        guild_count: u64,
        /// Set when the posting client is one shard of a group.
        shard: Option<ShardInfo>,
    },
    /// Per-shard counts collected by a shard manager.
    Sharded {
        /// Bot user ID.
        bot_id: String,
        /// Total shard count reported by the manager.
        shard_count: u32,
        /// Guild count of each shard.
        guild_counts: Vec<u64>,
    },
}

impl BotSnapshot {
    /// The bot user ID.
    pub fn bot_id(&self) -> &str {
        match self {
            Self::Flat { bot_id, .. } | Self::Sharded { bot_id, .. } => bot_id,
        }
    }

    /// Total guild count across all shards.
    pub fn total_guilds(&self) -> u64 {
        match self {
            Self::Flat { guild_count, .. } => *guild_count,
            Self::Sharded { guild_counts, .. } => guild_counts.iter().sum(),
        }
    }

    /// Number of per-shard entries (sharded snapshots only).
    pub fn shard_total(&self) -> Option<usize> {
        match self {
            Self::Flat { .. } => None,
            Self::Sharded { guild_counts, .. } => Some(guild_counts.len()),
        }
    }
}

/// The adapter a post reads its guild count from.
#[derive(Clone)]
pub enum BotSource {
    /// Values supplied directly by the caller.
    Fixed {
        /// Bot user ID.
        bot_id: String,
        /// Guild count.
        guild_count: u64,
    },
    /// A single live client.
    Client(Arc<dyn BotClient>),
    /// A live shard manager.
    Sharded(Arc<dyn ShardManager>),
}

impl BotSource {
    /// Fixed values. `bot_id` may be a string or an integer.
    pub fn fixed(bot_id: impl fmt::Display, guild_count: u64) -> Result<Self> {
        let bot_id = bot_id.to_string();
        if bot_id.trim().is_empty() {
            return Err(BotBlockError::InvalidArgument(
                "bot id may not be empty".to_string(),
            ));
        }
        Ok(Self::Fixed {
            bot_id,
            guild_count,
        })
    }

    /// Read from a single live client.
    pub fn client(client: Arc<dyn BotClient>) -> Self {
        Self::Client(client)
    }

    /// Read from a shard manager.
    pub fn sharded(manager: Arc<dyn ShardManager>) -> Self {
        Self::Sharded(manager)
    }

    /// Capture the current guild count.
    pub fn snapshot(&self) -> Result<BotSnapshot> {
        match self {
            Self::Fixed {
                bot_id,
                guild_count,
            } => Ok(BotSnapshot::Flat {
                bot_id: bot_id.clone(),
                guild_count: *guild_count,
                shard: None,
            }),
            Self::Client(client) => Ok(BotSnapshot::Flat {
                bot_id: self_id(client.as_ref())?,
                guild_count: client.guild_count().ok_or_else(|| {
                    BotBlockError::NotReady("guild cache is not available".to_string())
                })?,
                shard: client.shard_info(),
            }),
            Self::Sharded(manager) => {
                let shards = manager.shards();
                let first = shards.first().ok_or_else(|| {
                    BotBlockError::NotReady("shard manager has no shards".to_string())
                })?;
                let bot_id = self_id(first.as_ref())?;
                let guild_counts = shards
                    .iter()
                    .enumerate()
                    .map(|(index, shard)| shard_guild_count(shard.as_ref(), index))
                    .collect::<Result<Vec<_>>>()?;

                Ok(BotSnapshot::Sharded {
                    bot_id,
                    shard_count: manager.shard_total(),
                    guild_counts,
                })
            }
        }
    }
}

fn self_id(client: &dyn BotClient) -> Result<String> {
    client
        .self_id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BotBlockError::NotReady("self user is not available".to_string()))
}

fn shard_guild_count(client: &dyn BotClient, shard: usize) -> Result<u64> {
    client.guild_count().ok_or_else(|| {
        BotBlockError::NotReady(format!("guild cache of shard {shard} is not available"))
    })
}

impl fmt::Debug for BotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed {
                bot_id,
                guild_count,
            } => f
                .debug_struct("Fixed")
                .field("bot_id", bot_id)
                .field("guild_count", guild_count)
                .finish(),
            Self::Client(_) => f.write_str("Client(..)"),
            Self::Sharded(_) => f.write_str("Sharded(..)"),
        }
    }
}
