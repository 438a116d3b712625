//! Documents and free text from users

use teloxide::prelude::*;
use teloxide::types::Message;
use unicore::upload::FileRef;

use super::types::{sender_id, HandlerDeps, HandlerError};
use crate::telegram::menu::helpers::load_user;
use crate::telegram::menu::send_main_menu;
use crate::telegram::render;

/// Attachments of a message that count as files for an upload
pub(super) fn attached_files(msg: &Message) -> Vec<FileRef> {
    msg.document()
        .map(|doc| FileRef {
            id: doc.file.id.0.clone(),
            name: doc.file_name.clone(),
        })
        .into_iter()
        .collect()
}

/// Where a message with attachments goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AttachmentRoute {
    Upload,
    Unexpected,
}

/// Documents always enter the upload pipeline; photos and the like only count
/// as a failed upload while one is pending
pub(super) fn route_attachments(files: &[FileRef], upload_pending: bool) -> AttachmentRoute {
    if files.is_empty() && !upload_pending {
        AttachmentRoute::Unexpected
    } else {
        AttachmentRoute::Upload
    }
}

/// Feeds a message with attachments into the upload pipeline.
///
/// The outcome is reported asynchronously by the notifier once the burst window
/// closes.
pub(super) async fn handle_upload_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(telegram_id) = sender_id(msg.from.as_ref()) else {
        return Ok(());
    };
    let files = attached_files(msg);
    let pending = deps.uploads.tracker().resolve_expected(telegram_id).is_some();
    if route_attachments(&files, pending) == AttachmentRoute::Unexpected {
        return handle_unexpected_message(bot, msg, deps).await;
    }

    log::info!(
        "User {} sent {} file(s): {:?}",
        telegram_id,
        files.len(),
        files.iter().map(|f| f.name.as_deref().unwrap_or("?")).collect::<Vec<_>>()
    );
    if let Some(count) = deps.uploads.on_files(telegram_id, files) {
        log::debug!("Upload burst of user {} now has {} file(s)", telegram_id, count);
    }
    Ok(())
}

/// Any other message: re-send the menu with a notice and drop a pending upload
pub(super) async fn handle_unexpected_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(telegram_id) = sender_id(msg.from.as_ref()) else {
        return Ok(());
    };
    deps.uploads.clear(telegram_id);

    match load_user(&deps.db_pool, telegram_id)? {
        Some(user) => send_main_menu(bot, msg.chat.id, &user, Some(render::UNKNOWN_MESSAGE)).await?,
        None => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "{}\n\nОбратитесь к администратору для получения доступа.",
                    render::UNKNOWN_MESSAGE
                ),
            )
            .await?;
        }
    }
    Ok(())
}
