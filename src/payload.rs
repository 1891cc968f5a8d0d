//! Request body for `POST /api/count`.

use crate::source::BotSnapshot;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// JSON object sent to BotBlock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload {
    fields: Map<String, Value>,
    #[serde(skip)]
    bot_id: String,
}

impl Payload {
    /// Assemble the body from a snapshot and the site tokens.
    ///
    /// Flat snapshots post `server_count` as a number, adding `shard_id` and
    /// `shard_count` when the client is one shard of a group. Sharded
    /// snapshots post the per-shard counts as `server_count` and `shards`
    /// together with the manager's `shard_count`. Every token becomes a
    /// top-level field keyed by its site.
    pub fn build(snapshot: &BotSnapshot, credentials: &HashMap<String, String>) -> Self {
        let mut fields = Map::new();

        match snapshot {
            BotSnapshot::Flat {
                bot_id,
                guild_count,
                shard,
            } => {
                fields.insert("server_count".to_string(), json!(guild_count));
                fields.insert("bot_id".to_string(), json!(bot_id));
                if let Some(shard) = shard {
                    fields.insert("shard_id".to_string(), json!(shard.shard_id));
                    fields.insert("shard_count".to_string(), json!(shard.shard_count));
                }
            }
            BotSnapshot::Sharded {
                bot_id,
                shard_count,
                guild_counts,
            } => {
                fields.insert("server_count".to_string(), json!(guild_counts));
                fields.insert("bot_id".to_string(), json!(bot_id));
                fields.insert("shard_count".to_string(), json!(shard_count));
                fields.insert("shards".to_string(), json!(guild_counts));
            }
        }

        for (site, token) in credentials {
            fields.insert(site.clone(), Value::String(token.clone()));
        }

        Self {
            fields,
            bot_id: snapshot.bot_id().to_string(),
        }
    }

    /// Bot ID the payload reports for; also sent as the `User-Agent`.
    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The body as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
