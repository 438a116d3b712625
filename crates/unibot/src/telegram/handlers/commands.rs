//! /start, /whoami and /menu

use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};
use unicore::config;
use unicore::storage::{get_connection, users, Role};

use super::types::{sender_id, HandlerDeps, HandlerError};
use crate::telegram::menu::helpers::load_user;
use crate::telegram::menu::keyboards;
use crate::telegram::menu::send_main_menu;
use crate::telegram::render;

/// Greets the user according to who they are.
///
/// Configured super users are registered on the fly and get the role picker;
/// unknown users are told their id so an administrator can add them.
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(telegram_id) = sender_id(Some(from)) else {
        return Ok(());
    };
    deps.uploads.clear(telegram_id);

    if config::is_super_user(telegram_id) {
        let user = {
            let conn = get_connection(&deps.db_pool)?;
            users::upsert_super_user(&conn, telegram_id, &from.first_name, from.last_name.as_deref().unwrap_or(""))?
        };
        log::info!("Super user {} started the bot (role {})", telegram_id, user.role);
        if user.role == Role::SuperUser {
            bot.send_message(msg.chat.id, render::CHOOSE_ROLE)
                .reply_markup(keyboards::role_picker_keyboard())
                .await?;
        } else {
            send_main_menu(bot, msg.chat.id, &user, Some(render::welcome_text(user.role))).await?;
        }
        return Ok(());
    }

    match load_user(&deps.db_pool, telegram_id)? {
        Some(user) => {
            log::info!("User {} ({}) started the bot", telegram_id, user.role);
            send_main_menu(bot, msg.chat.id, &user, Some(render::welcome_text(user.role))).await?;
        }
        None => {
            log::info!("Unknown user {} started the bot", telegram_id);
            bot.send_message(msg.chat.id, render::unknown_user_text(telegram_id))
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}

pub(super) async fn handle_whoami_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    let Some(telegram_id) = sender_id(msg.from.as_ref()) else {
        return Ok(());
    };
    bot.send_message(msg.chat.id, render::whoami_text(telegram_id))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub(super) async fn handle_menu_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(telegram_id) = sender_id(msg.from.as_ref()) else {
        return Ok(());
    };
    deps.uploads.clear(telegram_id);
    match load_user(&deps.db_pool, telegram_id)? {
        Some(user) => send_main_menu(bot, msg.chat.id, &user, None).await?,
        None => {
            bot.send_message(msg.chat.id, render::unknown_user_text(telegram_id))
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}
