//! Discord adapter (serenity).
//!
//! This crate implements the `dcx-core` ChatPort over the Discord HTTP API and
//! feeds gateway messages into the core command dispatcher.

use std::{future::Future, path::Path, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use serenity::{
    builder::{CreateAttachment, CreateMessage, GetMessages},
    http::Http,
    model::{
        channel::{ChannelType, Message},
        id::MessageId,
    },
};

pub mod handlers;
pub mod router;

use dcx_core::{
    domain::{AttachmentRef, ChannelId, ChannelRef, GuildId, HistoryMessage},
    errors::Error,
    ports::ChatPort,
    Result,
};

#[derive(Clone)]
pub struct DiscordChat {
    http: Arc<Http>,
    downloads: reqwest::Client,
    page_size: u8,
}

impl DiscordChat {
    pub fn new(http: Arc<Http>, page_size: u8) -> Self {
        Self {
            http,
            downloads: reqwest::Client::new(),
            page_size: page_size.clamp(1, 100),
        }
    }

    pub fn from_token(token: &str, page_size: u8) -> Self {
        Self::new(Arc::new(Http::new(token)), page_size)
    }

    fn dc_channel(channel_id: ChannelId) -> serenity::model::id::ChannelId {
        serenity::model::id::ChannelId::new(channel_id.0)
    }

    fn dc_guild(guild_id: GuildId) -> serenity::model::id::GuildId {
        serenity::model::id::GuildId::new(guild_id.0)
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::External(format!("discord error: {e}"))
    }

    fn map_download_err(e: reqwest::Error) -> Error {
        Error::External(format!("attachment download failed: {e}"))
    }
}

#[async_trait]
impl ChatPort for DiscordChat {
    async fn find_text_channel(&self, guild: GuildId, name: &str) -> Result<Option<ChannelRef>> {
        let channels = Self::dc_guild(guild)
            .channels(&self.http)
            .await
            .map_err(Self::map_err)?;

        Ok(pick_text_channel(
            channels.into_values().map(|c| ChannelCandidate {
                id: c.id.get(),
                name: c.name,
                kind: c.kind,
                position: c.position,
            }),
            name,
        ))
    }

    async fn fetch_history(&self, channel: &ChannelRef) -> Result<Vec<HistoryMessage>> {
        let channel_id = Self::dc_channel(channel.id);
        let http = &self.http;
        let page_size = self.page_size;

        collect_history(page_size, |after| async move {
            channel_id
                .messages(http, GetMessages::new().after(after).limit(page_size))
                .await
                .map_err(Self::map_err)?
                .into_iter()
                .map(history_entry)
                .collect()
        })
        .await
    }

    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<()> {
        Self::dc_channel(channel)
            .say(&self.http, text)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn send_file(
        &self,
        channel: ChannelId,
        text: &str,
        path: &Path,
        file_name: &str,
    ) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        let attachment = CreateAttachment::bytes(data, file_name.to_string());
        Self::dc_channel(channel)
            .send_message(
                &self.http,
                CreateMessage::new().content(text).add_file(attachment),
            )
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn save_attachment(&self, attachment: &AttachmentRef, dest: &Path) -> Result<()> {
        let bytes = self
            .downloads
            .get(&attachment.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(Self::map_download_err)?
            .bytes()
            .await
            .map_err(Self::map_download_err)?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

/// Guild channel fields needed to resolve a name.
struct ChannelCandidate {
    id: u64,
    name: String,
    kind: ChannelType,
    position: u16,
}

/// Text and announcement channels both carry readable history.
fn is_text_channel(kind: ChannelType) -> bool {
    matches!(kind, ChannelType::Text | ChannelType::News)
}

/// Same-named channels: the first in sidebar order wins.
fn pick_text_channel(
    candidates: impl IntoIterator<Item = ChannelCandidate>,
    name: &str,
) -> Option<ChannelRef> {
    candidates
        .into_iter()
        .filter(|c| is_text_channel(c.kind) && c.name == name)
        .min_by_key(|c| (c.position, c.id))
        .map(|c| ChannelRef {
            id: ChannelId(c.id),
            name: c.name,
        })
}

fn history_entry(msg: Message) -> Result<(MessageId, HistoryMessage)> {
    let secs = msg.timestamp.unix_timestamp();
    let created_at = DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        Error::External(format!(
            "discord message {} has an out-of-range timestamp",
            msg.id
        ))
    })?;
    Ok((
        msg.id,
        HistoryMessage {
            author: msg.author.name,
            content: msg.content,
            created_at,
        },
    ))
}

/// One history page, ordered by id.
struct MergedPage {
    messages: Vec<HistoryMessage>,
    last: Option<MessageId>,
    full: bool,
}

/// Pages come back in no guaranteed order; snowflakes grow with time, so
/// sorting by id puts a page oldest first.
fn merge_page(mut page: Vec<(MessageId, HistoryMessage)>, page_size: u8) -> MergedPage {
    page.sort_by_key(|(id, _)| *id);
    let full = page.len() >= page_size as usize;
    let last = page.last().map(|(id, _)| *id);
    MergedPage {
        messages: page.into_iter().map(|(_, m)| m).collect(),
        last,
        full,
    }
}

/// Walk a channel forward from the smallest id until a short page.
async fn collect_history<F, Fut>(page_size: u8, mut fetch_page: F) -> Result<Vec<HistoryMessage>>
where
    F: FnMut(MessageId) -> Fut,
    Fut: Future<Output = Result<Vec<(MessageId, HistoryMessage)>>>,
{
    let mut out = Vec::new();
    let mut after = MessageId::new(1);

    loop {
        let page = merge_page(fetch_page(after).await?, page_size);
        out.extend(page.messages);
        match page.last {
            Some(last) if page.full => after = last,
            _ => break,
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(id: u64, content: &str) -> (MessageId, HistoryMessage) {
        (
            MessageId::new(id),
            HistoryMessage {
                author: "ann".to_string(),
                content: content.to_string(),
                created_at: Utc.timestamp_opt(1_700_000_000 + id as i64, 0).unwrap(),
            },
        )
    }

    /// Serves `total` messages (ids 2..) newest first, the way the API may
    /// order a page, and records every `after` cursor it was asked for.
    async fn page_through(total: u64, page_size: u8) -> (Vec<HistoryMessage>, Vec<u64>) {
        let mut cursors = Vec::new();
        let history = collect_history(page_size, |after| {
            cursors.push(after.get());
            let mut page: Vec<_> = (2..2 + total)
                .filter(|id| *id > after.get())
                .take(page_size as usize)
                .map(|id| entry(id, &format!("m{id}")))
                .collect();
            page.reverse();
            async move { Ok(page) }
        })
        .await
        .unwrap();
        (history, cursors)
    }

    fn contents(history: &[HistoryMessage]) -> Vec<String> {
        history.iter().map(|m| m.content.clone()).collect()
    }

    #[test]
    fn merge_page_sorts_by_id_and_reports_fullness() {
        let page = merge_page(vec![entry(9, "c"), entry(3, "a"), entry(5, "b")], 3);
        assert_eq!(contents(&page.messages), vec!["a", "b", "c"]);
        assert_eq!(page.last, Some(MessageId::new(9)));
        assert!(page.full);

        let short = merge_page(vec![entry(4, "x")], 3);
        assert!(!short.full);

        let empty = merge_page(Vec::new(), 3);
        assert!(empty.messages.is_empty());
        assert_eq!(empty.last, None);
    }

    #[tokio::test]
    async fn collects_every_page_oldest_first() {
        let (history, cursors) = page_through(7, 3).await;
        assert_eq!(
            contents(&history),
            (2..9).map(|id| format!("m{id}")).collect::<Vec<_>>()
        );
        // Pages of 3, 3, then a short page of 1.
        assert_eq!(cursors, vec![1, 4, 7]);
    }

    #[tokio::test]
    async fn exactly_full_last_page_is_followed_by_an_empty_one() {
        let (history, cursors) = page_through(6, 3).await;
        assert_eq!(history.len(), 6);
        assert_eq!(cursors, vec![1, 4, 7]);
    }

    #[tokio::test]
    async fn short_first_page_stops_immediately() {
        let (history, cursors) = page_through(2, 100).await;
        assert_eq!(contents(&history), vec!["m2", "m3"]);
        assert_eq!(cursors, vec![1]);

        let (empty, cursors) = page_through(0, 100).await;
        assert!(empty.is_empty());
        assert_eq!(cursors, vec![1]);
    }

    #[tokio::test]
    async fn page_errors_abort_the_walk() {
        let err = collect_history(2, |_after| async {
            Err(Error::External("discord error: boom".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }

    fn candidate(id: u64, name: &str, kind: ChannelType, position: u16) -> ChannelCandidate {
        ChannelCandidate {
            id,
            name: name.to_string(),
            kind,
            position,
        }
    }

    #[test]
    fn announcement_channels_resolve_by_name() {
        let found = pick_text_channel(
            vec![candidate(7, "announcements", ChannelType::News, 0)],
            "announcements",
        );
        assert_eq!(
            found,
            Some(ChannelRef {
                id: ChannelId(7),
                name: "announcements".to_string()
            })
        );
    }

    #[test]
    fn voice_channels_and_other_names_are_skipped() {
        let candidates = vec![
            candidate(1, "general", ChannelType::Voice, 0),
            candidate(2, "General", ChannelType::Text, 1),
        ];
        assert_eq!(pick_text_channel(candidates, "general"), None);
    }

    #[test]
    fn duplicate_names_pick_the_first_in_sidebar_order() {
        let candidates = vec![
            candidate(30, "general", ChannelType::Text, 5),
            candidate(20, "general", ChannelType::News, 2),
            candidate(10, "general", ChannelType::Text, 2),
        ];
        let found = pick_text_channel(candidates, "general").unwrap();
        assert_eq!(found.id, ChannelId(10));
    }
}
