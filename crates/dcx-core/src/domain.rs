use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{errors::Error, Result};

/// Format of [`MessageRecord::timestamp`]: second precision, no zone marker.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Discord guild (server) id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuildId(pub u64);

/// Discord channel id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// Discord message id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

/// A text channel resolved by name inside a guild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
}

/// One message as returned by the platform history endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryMessage {
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A file attached to the invoking command message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// Where a command was issued from and what came with it.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub attachments: Vec<AttachmentRef>,
}

/// One exported chat message.
///
/// The serialized form has exactly these four keys. All of them are required
/// on input; a missing or `null` field fails deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub author: String,
    pub content: String,
    pub timestamp: String,
    pub channel_name: String,
}

impl MessageRecord {
    pub fn from_history(msg: HistoryMessage, channel_name: &str) -> Self {
        Self {
            author: msg.author,
            content: msg.content,
            timestamp: msg.created_at.format(TIMESTAMP_FORMAT).to_string(),
            channel_name: channel_name.to_string(),
        }
    }

    /// Parse `timestamp` under [`TIMESTAMP_FORMAT`].
    pub fn parsed_timestamp(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).map_err(|source| {
            Error::InvalidTimestamp {
                value: self.timestamp.clone(),
                source,
            }
        })
    }
}
