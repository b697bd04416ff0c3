use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{AttachmentRef, ChannelId, ChannelRef, GuildId, HistoryMessage, MessageRecord},
    Result,
};

/// Hexagonal port for the chat platform.
///
/// Discord is the only implementation; tests drive the command handlers
/// through an in-memory fake.
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Look up a text channel of `guild` by exact name.
    async fn find_text_channel(&self, guild: GuildId, name: &str) -> Result<Option<ChannelRef>>;

    /// Complete history of `channel`, oldest first.
    async fn fetch_history(&self, channel: &ChannelRef) -> Result<Vec<HistoryMessage>>;

    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<()>;

    /// Send `text` with the file at `path` attached under `file_name`.
    async fn send_file(
        &self,
        channel: ChannelId,
        text: &str,
        path: &Path,
        file_name: &str,
    ) -> Result<()>;

    /// Download an attachment of the invoking message to `dest`.
    async fn save_attachment(&self, attachment: &AttachmentRef, dest: &Path) -> Result<()>;
}

/// Renders sorted records into a paginated document at `out`.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, records: &[MessageRecord], out: &Path) -> Result<()>;
}
