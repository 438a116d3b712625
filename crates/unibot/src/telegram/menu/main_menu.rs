//! Role menus and super-user role switching

use teloxide::prelude::*;
use teloxide::types::MessageId;
use unicore::storage::{get_connection, users, DbPool, Role, User};

use super::helpers::{edit_or_send, send_html};
use super::keyboards;
use crate::telegram::handlers::HandlerError;
use crate::telegram::render;

fn menu_text(user: &User, notice: Option<&str>) -> String {
    match notice {
        Some(notice) => format!("{}\n\n{}", notice, render::main_menu_text(user.role)),
        None => render::main_menu_text(user.role).to_string(),
    }
}

/// Sends the main menu for the user's role as a new message
pub async fn send_main_menu(bot: &Bot, chat_id: ChatId, user: &User, notice: Option<&str>) -> ResponseResult<()> {
    send_html(bot, chat_id, menu_text(user, notice), Some(keyboards::main_menu_keyboard(user))).await
}

/// Replaces the current menu message with the main menu
pub async fn edit_main_menu(bot: &Bot, chat_id: ChatId, message_id: MessageId, user: &User) -> ResponseResult<()> {
    edit_or_send(
        bot,
        chat_id,
        Some(message_id),
        menu_text(user, None),
        keyboards::main_menu_keyboard(user),
    )
    .await
}

pub async fn show_role_picker(bot: &Bot, chat_id: ChatId, message_id: MessageId) -> ResponseResult<()> {
    edit_or_send(
        bot,
        chat_id,
        Some(message_id),
        render::CHOOSE_ROLE.to_string(),
        keyboards::role_picker_keyboard(),
    )
    .await
}

/// Stores the picked role and shows its menu
pub async fn switch_role(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    db_pool: &DbPool,
    user: &User,
    role: Role,
) -> Result<(), HandlerError> {
    {
        let conn = get_connection(db_pool)?;
        users::set_role(&conn, user.id, role)?;
    }
    log::info!("Super user {} switched role to {}", user.id, role);

    let switched = User { role, ..user.clone() };
    edit_or_send(
        bot,
        chat_id,
        Some(message_id),
        format!("{}\n\n{}", render::welcome_text(role), render::main_menu_text(role)),
        keyboards::main_menu_keyboard(&switched),
    )
    .await?;
    Ok(())
}
