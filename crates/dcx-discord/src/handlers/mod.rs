//! Discord message handlers.
//!
//! Each gateway message is:
//! - ignored if it comes from a bot or is not a known prefix command
//! - converted into a platform-neutral `Invocation`
//! - handed to the `dcx-core` dispatcher, which replies and logs

use std::sync::Arc;

use serenity::all::{Attachment, Message};

use dcx_core::{
    commands::{dispatch, parse_command},
    domain::{AttachmentRef, ChannelId, GuildId, Invocation, MessageId},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) {
    if msg.author.bot {
        return;
    }

    let Some(command) = parse_command(&msg.content, &state.cfg.command_prefix) else {
        return;
    };

    let inv = Invocation {
        guild_id: msg.guild_id.map(|g| GuildId(g.get())),
        channel_id: ChannelId(msg.channel_id.get()),
        message_id: MessageId(msg.id.get()),
        attachments: msg.attachments.iter().map(attachment_ref).collect(),
    };

    dispatch(&state.session, &inv, command).await;
}

fn attachment_ref(a: &Attachment) -> AttachmentRef {
    AttachmentRef {
        filename: a.filename.clone(),
        url: a.url.clone(),
        size: u64::from(a.size),
    }
}
