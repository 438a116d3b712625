use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::RequestError;
use unicore::storage::{get_connection, users, DbConnection, DbPool, User};
use unicore::AppResult;

use crate::telegram::handlers::HandlerError;

pub(crate) type MenuResult = Result<(), HandlerError>;

/// The menu message a callback came from and the user who pressed it
pub(crate) struct MenuContext<'a> {
    pub bot: &'a Bot,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub db_pool: &'a DbPool,
    pub user: &'a User,
}

impl MenuContext<'_> {
    pub fn conn(&self) -> AppResult<DbConnection> {
        Ok(get_connection(self.db_pool)?)
    }

    /// Replaces the menu message
    pub async fn show(&self, text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> MenuResult {
        edit_or_send(self.bot, self.chat_id, Some(self.message_id), text.into(), keyboard).await?;
        Ok(())
    }
}

/// Edits the menu message in place, falling back to a new message.
///
/// Telegram refuses to edit messages that are too old or unchanged; an
/// unchanged edit is not an error.
pub(crate) async fn edit_or_send(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> ResponseResult<()> {
    if let Some(message_id) = message_id {
        match bot
            .edit_message_text(chat_id, message_id, text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) if e.to_string().contains("message is not modified") => return Ok(()),
            Err(e) => log::debug!("Edit of menu message failed, sending new one: {}", e),
        }
    }
    send_html(bot, chat_id, text, Some(keyboard)).await
}

pub(crate) async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> ResponseResult<()> {
    let mut req = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    if let Some(kb) = keyboard {
        req = req.reply_markup(kb);
    }
    req.await?;
    Ok(())
}

/// Sends a plain notice, logging instead of failing
pub(crate) async fn send_notice(bot: &Bot, chat_id: ChatId, text: &str) {
    if let Err(e) = bot.send_message(chat_id, text).await {
        log::warn!("Failed to send notice to {}: {}", chat_id, e);
    }
}

/// Looks up the registered user behind a Telegram id
pub(crate) fn load_user(db_pool: &DbPool, telegram_id: i64) -> AppResult<Option<User>> {
    let conn = get_connection(db_pool)?;
    Ok(users::find_by_external_id(&conn, telegram_id)?)
}

pub(crate) fn is_blocked(e: &RequestError) -> bool {
    e.to_string().contains("bot was blocked by the user")
}
