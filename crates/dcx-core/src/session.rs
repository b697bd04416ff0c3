use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{info, warn};

use crate::{
    config::Config,
    domain::{AttachmentRef, Invocation, MessageId, MessageRecord},
    errors::Error,
    export::{
        document_file_name, export_file_name, read_export, sort_messages, write_export,
        EXPORT_EXTENSION,
    },
    ports::{ChatPort, DocumentRenderer},
    Result,
};

/// Result of a `fetch_logs` run that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    NoChannelsGiven,
    /// Nothing resolved or every resolved channel was empty. No file written.
    NothingFetched,
    Exported { file_name: String, records: usize },
}

/// Result of an `export_to_pdf` run that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    MissingAttachment,
    Rendered { file_name: String, records: usize },
}

/// Long-lived handle shared by every command invocation.
///
/// Created once at startup; holds no per-invocation state.
pub struct ExportSession {
    cfg: Arc<Config>,
    chat: Arc<dyn ChatPort>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl ExportSession {
    pub fn new(
        cfg: Arc<Config>,
        chat: Arc<dyn ChatPort>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            cfg,
            chat,
            renderer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn chat(&self) -> &dyn ChatPort {
        self.chat.as_ref()
    }

    /// Collect, merge and sort the history of `channel_names`, then send it
    /// back as one JSON file.
    pub async fn fetch_logs(
        &self,
        inv: &Invocation,
        channel_names: &[String],
    ) -> Result<FetchOutcome> {
        if channel_names.is_empty() {
            return Ok(FetchOutcome::NoChannelsGiven);
        }
        let guild = inv.guild_id.ok_or(Error::NotInGuild)?;

        let mut records: Vec<MessageRecord> = Vec::new();
        let mut resolved: Vec<String> = Vec::new();

        for name in channel_names {
            let Some(channel) = self.chat.find_text_channel(guild, name).await? else {
                info!(channel = %name, "channel not found");
                self.chat
                    .send_text(inv.channel_id, &format!("Channel '{name}' not found!"))
                    .await?;
                continue;
            };

            let history = self.chat.fetch_history(&channel).await?;
            info!(channel = %channel.name, messages = history.len(), "fetched channel history");

            records.extend(
                history
                    .into_iter()
                    .map(|m| MessageRecord::from_history(m, &channel.name)),
            );
            resolved.push(channel.name);
        }

        if records.is_empty() {
            return Ok(FetchOutcome::NothingFetched);
        }

        let sorted = sort_messages(records)?;
        let file_name = export_file_name(&resolved);

        let dir = InvocationDir::create(&self.cfg.work_dir, inv.message_id).await?;
        let sent = self
            .send_export(inv, channel_names, &dir, &file_name, &sorted)
            .await;
        dir.finish(sent).await?;

        info!(file = %file_name, records = sorted.len(), "export sent");
        Ok(FetchOutcome::Exported {
            file_name,
            records: sorted.len(),
        })
    }

    async fn send_export(
        &self,
        inv: &Invocation,
        channel_names: &[String],
        dir: &InvocationDir,
        file_name: &str,
        records: &[MessageRecord],
    ) -> Result<()> {
        let path = dir.path().join(file_name);
        write_export(&path, records).await?;

        self.chat
            .send_text(
                inv.channel_id,
                &format!(
                    "Logs from {} have been combined and saved as {file_name}.",
                    channel_names.join(", ")
                ),
            )
            .await?;
        self.chat
            .send_file(
                inv.channel_id,
                "Here are the combined logs:",
                &path,
                file_name,
            )
            .await
    }

    /// Render the JSON export attached to the invoking message as a PDF.
    pub async fn export_to_pdf(&self, inv: &Invocation) -> Result<RenderOutcome> {
        let Some(attachment) = inv.attachments.first() else {
            return Ok(RenderOutcome::MissingAttachment);
        };

        if attachment.size > self.cfg.max_attachment_bytes {
            return Err(Error::AttachmentTooLarge {
                name: attachment.filename.clone(),
                size: attachment.size,
                max: self.cfg.max_attachment_bytes,
            });
        }

        let dir = InvocationDir::create(&self.cfg.work_dir, inv.message_id).await?;
        let rendered = self.render_attachment(inv, attachment, &dir).await;
        let (output_name, records) = dir.finish(rendered).await?;

        info!(file = %output_name, records, "document sent");
        Ok(RenderOutcome::Rendered {
            file_name: output_name,
            records,
        })
    }

    async fn render_attachment(
        &self,
        inv: &Invocation,
        attachment: &AttachmentRef,
        dir: &InvocationDir,
    ) -> Result<(String, usize)> {
        let input_name = local_file_name(&attachment.filename);
        let input_path = dir.path().join(&input_name);
        self.chat.save_attachment(attachment, &input_path).await?;

        self.chat
            .send_text(
                inv.channel_id,
                &format!("Starting PDF generation for {input_name}..."),
            )
            .await?;

        let records = read_export(&input_path).await?;
        // Always re-sort: the input may be hand-edited or produced elsewhere.
        let sorted = sort_messages(records)?;
        let count = sorted.len();

        let output_name = document_file_name(&input_name);
        let output_path = dir.path().join(&output_name);
        self.render_off_runtime(sorted, output_path.clone()).await?;

        self.chat
            .send_file(
                inv.channel_id,
                &format!("Here is the generated PDF ({output_name}):"),
                &output_path,
                &output_name,
            )
            .await?;

        Ok((output_name, count))
    }

    /// Layout and file output are blocking; keep them off the async workers.
    async fn render_off_runtime(&self, records: Vec<MessageRecord>, out: PathBuf) -> Result<()> {
        let renderer = Arc::clone(&self.renderer);
        tokio::task::spawn_blocking(move || renderer.render(&records, &out))
            .await
            .map_err(|e| Error::External(format!("document render task failed: {e}")))?
    }
}

/// Final path component of an attachment name.
fn local_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if base.is_empty() || base == "." || base == ".." {
        format!("export{EXPORT_EXTENSION}")
    } else {
        base.to_string()
    }
}

/// Scratch directory owned by one invocation, keyed by the invoking message id.
struct InvocationDir {
    path: PathBuf,
}

impl InvocationDir {
    async fn create(work_dir: &Path, message_id: MessageId) -> Result<Self> {
        let path = work_dir.join(format!("invocation-{}", message_id.0));
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory, then hand back `result`.
    ///
    /// A failed invocation keeps its own error; the cleanup failure is only
    /// logged in that case.
    async fn finish<T>(self, result: Result<T>) -> Result<T> {
        let removed = tokio::fs::remove_dir_all(&self.path).await;
        match (result, removed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), removed) => {
                if let Err(cleanup) = removed {
                    warn!(
                        path = %self.path.display(),
                        error = %cleanup,
                        "failed to remove invocation dir"
                    );
                }
                Err(e)
            }
        }
    }
}
