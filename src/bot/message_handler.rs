//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Me, Message, ParseMode};
use tracing::debug;

use crate::action::Action;
use crate::app::AppContext;
use crate::session::{session_for, SessionStorage};

use super::dialogue_manager::dispatch;
use super::ui_builder::{create_menu_keyboard, Reply, ReplyFormat};

/// Send `reply` as a new message with its keyboard
pub async fn send_reply(
    bot: &Bot,
    chat_id: ChatId,
    reply: &Reply,
    ctx: &AppContext,
    language_code: Option<&str>,
) -> Result<()> {
    let keyboard = create_menu_keyboard(&reply.options, &ctx.localizer, language_code);
    let mut request = bot
        .send_message(chat_id, reply.text.clone())
        .reply_markup(keyboard);
    if reply.format == ReplyFormat::Html {
        request = request.parse_mode(ParseMode::Html);
    }
    request.await?;
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    me: Me,
    ctx: Arc<AppContext>,
    storage: Arc<SessionStorage>,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without sender");
        return Ok(());
    };

    // Extract user's language code from Telegram
    let language_code = user.language_code.as_deref();

    let action = msg
        .text()
        .and_then(|text| Action::from_command(text, Some(me.username())));

    match action {
        Some(action) => {
            debug!(user_id = %user.id, action = ?action, "Received command from user");
            let session = session_for(storage, user.id);
            let reply = dispatch(&ctx, &session, user.id, action, language_code).await?;
            send_reply(&bot, msg.chat.id, &reply, &ctx, language_code).await?;
        }
        None => {
            debug!(user_id = %user.id, "Received non-command message from user");
            bot.send_message(msg.chat.id, ctx.localizer.t_lang("text-hint", language_code))
                .await?;
        }
    }

    Ok(())
}
