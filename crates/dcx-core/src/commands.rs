//! Prefix command parsing and the reply boundary.
//!
//! Handlers in [`crate::session`] return `Result<Outcome>`; this module turns
//! that into the text the requester sees and logs unclassified failures.

use tracing::{error, info, warn};

use crate::{
    domain::Invocation,
    session::{ExportSession, FetchOutcome, RenderOutcome},
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    FetchLogs { channels: Vec<String> },
    ExportToPdf,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::FetchLogs { .. } => "fetch_logs",
            Command::ExportToPdf => "export_to_pdf",
        }
    }

    /// Channel names the command was given, for logging.
    pub fn channels(&self) -> &[String] {
        match self {
            Command::FetchLogs { channels } => channels,
            Command::ExportToPdf => &[],
        }
    }
}

/// Parse `<prefix><name> [args...]`. Unknown commands and plain chat yield `None`.
pub fn parse_command(text: &str, prefix: &str) -> Option<Command> {
    let rest = text.trim_start().strip_prefix(prefix)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut args = split_args(rest).into_iter();
    let name = args.next()?;
    match name.as_str() {
        "fetch_logs" => Some(Command::FetchLogs {
            channels: args.collect(),
        }),
        "export_to_pdf" => Some(Command::ExportToPdf),
        _ => None,
    }
}

/// Split on whitespace; a double-quoted run forms a single argument.
fn split_args(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in s.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    out.push(std::mem::take(&mut cur));
                    has_token = false;
                }
            }
            c => {
                cur.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        out.push(cur);
    }
    out
}

pub fn fetch_reply(result: &Result<FetchOutcome>) -> Option<String> {
    match result {
        Ok(FetchOutcome::Exported { .. }) => None,
        Ok(FetchOutcome::NoChannelsGiven) => {
            Some("Please specify at least one channel.".to_string())
        }
        Ok(FetchOutcome::NothingFetched) => Some("No messages were fetched.".to_string()),
        Err(e) => Some(format!("Error fetching logs: {e}")),
    }
}

pub fn render_reply(result: &Result<RenderOutcome>) -> Option<String> {
    match result {
        Ok(RenderOutcome::Rendered { .. }) => None,
        Ok(RenderOutcome::MissingAttachment) => {
            Some("Please attach a JSON file to this command.".to_string())
        }
        Err(e) => Some(format!("Error generating PDF: {e}")),
    }
}

/// Run one command to completion and report its outcome to the requester.
///
/// Never fails: every error ends up as a reply and a log line.
pub async fn dispatch(session: &ExportSession, inv: &Invocation, command: Command) {
    info!(
        command = command.name(),
        channels = ?command.channels(),
        channel_id = inv.channel_id.0,
        message_id = inv.message_id.0,
        "command received"
    );

    let reply = match command {
        Command::FetchLogs { channels } => {
            let result = session.fetch_logs(inv, &channels).await;
            if let Err(e) = &result {
                error!(error = %e, "Error in fetch_logs");
            }
            fetch_reply(&result)
        }
        Command::ExportToPdf => {
            let result = session.export_to_pdf(inv).await;
            if let Err(e) = &result {
                error!(error = %e, "Error in export_to_pdf");
            }
            render_reply(&result)
        }
    };

    if let Some(text) = reply {
        if let Err(e) = session.chat().send_text(inv.channel_id, &text).await {
            warn!(error = %e, "failed to send command reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{
        errors::Error,
        session::tests::{guild_invocation, msg, test_config, tmp_dir, FakeChat, FakeRenderer},
    };

    #[test]
    fn parses_fetch_logs_with_channels() {
        assert_eq!(
            parse_command("!fetch_logs general random", "!"),
            Some(Command::FetchLogs {
                channels: vec!["general".to_string(), "random".to_string()]
            })
        );
        assert_eq!(
            parse_command("!fetch_logs   general\trandom  ", "!"),
            Some(Command::FetchLogs {
                channels: vec!["general".to_string(), "random".to_string()]
            })
        );
    }

    #[test]
    fn parses_quoted_channel_names() {
        assert_eq!(
            parse_command(r#"!fetch_logs "team chat!" dev"#, "!"),
            Some(Command::FetchLogs {
                channels: vec!["team chat!".to_string(), "dev".to_string()]
            })
        );
        assert_eq!(split_args(r#""" x"#), vec!["".to_string(), "x".to_string()]);
    }

    #[test]
    fn parses_export_and_ignores_other_text() {
        assert_eq!(
            parse_command("!export_to_pdf", "!"),
            Some(Command::ExportToPdf)
        );
        assert_eq!(parse_command("?export_to_pdf", "?"), Some(Command::ExportToPdf));
        assert_eq!(parse_command("export_to_pdf", "!"), None);
        assert_eq!(parse_command("! fetch_logs general", "!"), None);
        assert_eq!(parse_command("!Fetch_Logs general", "!"), None);
        assert_eq!(parse_command("!", "!"), None);
        assert_eq!(parse_command("hello !fetch_logs", "!"), None);
    }

    #[test]
    fn command_exposes_its_channel_args() {
        let cmd = parse_command(r#"!fetch_logs general "team chat""#, "!").unwrap();
        assert_eq!(cmd.name(), "fetch_logs");
        assert_eq!(cmd.channels(), ["general", "team chat"]);
        assert!(Command::ExportToPdf.channels().is_empty());
    }

    #[test]
    fn replies_for_outcomes() {
        assert_eq!(
            fetch_reply(&Ok(FetchOutcome::NothingFetched)).as_deref(),
            Some("No messages were fetched.")
        );
        assert_eq!(
            fetch_reply(&Ok(FetchOutcome::Exported {
                file_name: "x_logs.json".to_string(),
                records: 1
            })),
            None
        );
        assert_eq!(
            fetch_reply(&Err(Error::External("boom".to_string()))).as_deref(),
            Some("Error fetching logs: external error: boom")
        );
        assert_eq!(
            render_reply(&Ok(RenderOutcome::MissingAttachment)).as_deref(),
            Some("Please attach a JSON file to this command.")
        );
        assert!(render_reply(&Err(Error::Render("bad font".to_string())))
            .unwrap()
            .starts_with("Error generating PDF: "));
    }

    #[tokio::test]
    async fn dispatch_reports_missing_attachment() {
        let work = tmp_dir("dcx-dispatch-pdf");
        let chat = Arc::new(FakeChat::default());
        let session = ExportSession::new(
            test_config(work.clone()),
            chat.clone(),
            Arc::new(FakeRenderer::default()),
        );

        dispatch(&session, &guild_invocation(vec![]), Command::ExportToPdf).await;

        assert_eq!(
            chat.sent_texts(),
            vec!["Please attach a JSON file to this command.".to_string()]
        );
        assert!(chat.sent_files().is_empty());
    }

    #[tokio::test]
    async fn dispatch_reports_no_messages_and_errors() {
        let work = tmp_dir("dcx-dispatch-fetch");
        let chat = Arc::new(FakeChat {
            channels: vec![("general".to_string(), vec![msg("a", "b", 1, 0)])],
            ..Default::default()
        });
        let session = ExportSession::new(
            test_config(work.clone()),
            chat.clone(),
            Arc::new(FakeRenderer::default()),
        );

        dispatch(
            &session,
            &guild_invocation(vec![]),
            Command::FetchLogs {
                channels: vec!["missing".to_string()],
            },
        )
        .await;
        assert_eq!(
            chat.sent_texts(),
            vec![
                "Channel 'missing' not found!".to_string(),
                "No messages were fetched.".to_string()
            ]
        );

        let mut dm = guild_invocation(vec![]);
        dm.guild_id = None;
        dispatch(
            &session,
            &dm,
            Command::FetchLogs {
                channels: vec!["general".to_string()],
            },
        )
        .await;
        let texts = chat.sent_texts();
        assert!(texts
            .last()
            .unwrap()
            .starts_with("Error fetching logs: this command can only be used inside a server"));

        let _ = std::fs::remove_dir_all(&work);
    }
}
