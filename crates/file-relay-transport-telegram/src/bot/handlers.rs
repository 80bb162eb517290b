//! Message handlers
//!
//! Every update ends up in [`dispatch_event`], which runs the relay and
//! sends back the rendered reply.

use crate::bot::delivery::TelegramMediaTransport;
use crate::bot::views::{self, render_reply, ViewContext};
use crate::config::BotSettings;
use anyhow::Result;
use file_relay_core::dispatch::{FileRelay, InboundEvent, Reply};
use teloxide::prelude::*;
use teloxide::types::{Me, ParseMode};
use tracing::{debug, error, info};

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Run one event through the relay and answer in the originating chat.
///
/// Storage failures are logged and answered with a generic notice.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn dispatch_event(
    bot: &Bot,
    msg: &Message,
    me: &Me,
    relay: &FileRelay,
    settings: &BotSettings,
    event: InboundEvent,
) -> Result<()> {
    let user_id = get_user_id_safe(msg);
    debug!(user_id, ?event, "Dispatching event.");
    if matches!(event, InboundEvent::Start { .. }) {
        info!("User {user_id} ({}) initiated /start command.", get_user_name(msg));
    }

    let transport = TelegramMediaTransport::new(bot.clone());
    let reply = match relay
        .handle_in_chat(&transport, user_id, msg.chat.id.0, event)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            error!(user_id, error = %e, "Relay failed to handle event");
            bot.send_message(msg.chat.id, views::GENERIC_ERROR).await?;
            return Ok(());
        }
    };

    if let Reply::UploadComplete { link_token, .. } = &reply {
        info!(user_id, link_token = %link_token, "Share link issued.");
    }

    let ctx = ViewContext {
        bot_username: me.username(),
        settings: &settings.telegram,
    };
    let Some(view) = render_reply(&reply, &ctx) else {
        return Ok(());
    };

    let mut req = bot
        .send_message(msg.chat.id, view.text)
        .parse_mode(ParseMode::Html);
    if let Some(markup) = view.markup {
        req = req.reply_markup(markup);
    }
    req.await?;
    Ok(())
}
