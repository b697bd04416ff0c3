use std::sync::Arc;

use serenity::{
    all::{Context, EventHandler, GatewayIntents, Message, Ready},
    async_trait, Client,
};
use tracing::{info, warn};

use dcx_core::{config::Config, session::ExportSession};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub session: Arc<ExportSession>,
}

struct Handler {
    state: Arc<AppState>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Logged in as {}!", ready.user.name);
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        handlers::handle_message(msg, self.state.clone()).await;
    }
}

/// Gateway events the bot needs: guild channel listing plus message bodies.
fn gateway_intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Connect to the gateway and dispatch commands until shutdown (Ctrl-C).
pub async fn run_gateway(cfg: Arc<Config>, session: Arc<ExportSession>) -> anyhow::Result<()> {
    info!(prefix = %cfg.command_prefix, work_dir = %cfg.work_dir.display(), "starting bot");

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        session,
    });

    let mut client = Client::builder(&cfg.discord_token, gateway_intents())
        .event_handler(Handler { state })
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("shutting down");
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}
