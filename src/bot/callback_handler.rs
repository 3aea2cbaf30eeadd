//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, ParseMode};
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

use crate::action::Action;
use crate::app::AppContext;
use crate::session::{session_for, SessionStorage};

use super::dialogue_manager::dispatch;
use super::message_handler::send_reply;
use super::ui_builder::{create_menu_keyboard, ReplyFormat};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<AppContext>,
    storage: Arc<SessionStorage>,
) -> Result<()> {
    let data = q.data.as_deref().unwrap_or("");
    let language_code = q.from.language_code.as_deref();
    let action = Action::from_callback_data(data, ctx.workshops());
    debug!(user_id = %q.from.id, action = ?action, "Received callback query from user");

    // Answer the callback query to remove the loading state. Telegram refuses
    // answers to stale queries; the press is still handled.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let session = session_for(storage, q.from.id);
    let reply = dispatch(&ctx, &session, q.from.id, action, language_code).await?;

    let Some(msg) = &q.message else {
        return send_reply(&bot, ChatId::from(q.from.id), &reply, &ctx, language_code).await;
    };

    // Edit the message carrying the keyboard
    let keyboard = create_menu_keyboard(&reply.options, &ctx.localizer, language_code);
    let mut request = bot
        .edit_message_text(msg.chat().id, msg.id(), reply.text.clone())
        .reply_markup(keyboard);
    if reply.format == ReplyFormat::Html {
        request = request.parse_mode(ParseMode::Html);
    }

    match request.await {
        Ok(_) => Ok(()),
        Err(RequestError::Api(ApiError::MessageNotModified)) => {
            debug!(user_id = %q.from.id, "Message already shows this reply");
            Ok(())
        }
        Err(e) => {
            warn!(user_id = %q.from.id, error = %e, "Failed to edit message, sending a new one");
            send_reply(&bot, msg.chat().id, &reply, &ctx, language_code).await
        }
    }
}
