use std::sync::Arc;

use dcx_core::{config::Config, session::ExportSession};
use dcx_discord::DiscordChat;
use dcx_pdf::PdfRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dcx_core::logging::init("dcx")?;

    let cfg = Arc::new(Config::load()?);

    let chat = Arc::new(DiscordChat::from_token(
        &cfg.discord_token,
        cfg.history_page_size,
    ));
    let session = Arc::new(ExportSession::new(
        cfg.clone(),
        chat,
        Arc::new(PdfRenderer::new()),
    ));

    if let Err(e) = dcx_discord::router::run_gateway(cfg, session).await {
        tracing::error!(error = %e, "discord bot failed");
        return Err(e);
    }

    Ok(())
}
