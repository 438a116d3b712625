//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use unicore::DedupGuard;

use super::commands::{handle_menu_command, handle_start_command, handle_whoami_command};
use super::types::{HandlerDeps, HandlerError};
use super::uploads::{handle_unexpected_message, handle_upload_message};
use crate::telegram::bot::Command;
use crate::telegram::menu::handle_menu_callback;

/// Creates the dispatcher schema for the bot.
///
/// Every branch admits its update through the dedup guard first, so a
/// redelivered message or callback is dropped while the first copy is still
/// being handled.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.chat.is_private())
                .branch(command_handler(deps.clone()))
                .branch(upload_handler(deps.clone()))
                .branch(message_handler(deps.clone())),
        )
        .branch(callback_handler(deps))
}

fn has_attachment(msg: &Message) -> bool {
    msg.document().is_some()
        || msg.photo().is_some()
        || msg.video().is_some()
        || msg.audio().is_some()
        || msg.voice().is_some()
        || msg.animation().is_some()
}

fn message_key(msg: &Message) -> String {
    DedupGuard::message_key(msg.chat.id.0, msg.id.0)
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry().filter_command::<Command>().endpoint(move |bot: Bot, msg: Message, cmd: Command| {
        let deps = deps.clone();
        async move {
            let Some(_admission) = deps.dedup.admit(message_key(&msg)) else {
                log::debug!("Dropping duplicate command {}", message_key(&msg));
                return Ok(());
            };
            log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

            let result = match cmd {
                Command::Start => handle_start_command(&bot, &msg, &deps).await,
                Command::Whoami => handle_whoami_command(&bot, &msg).await,
                Command::Menu => handle_menu_command(&bot, &msg, &deps).await,
            };
            if let Err(e) = result {
                log::error!("Command {:?} failed in chat {}: {}", cmd, msg.chat.id, e);
            }
            Ok(())
        }
    })
}

fn upload_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::filter(|msg: Message| has_attachment(&msg)).endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move {
            let Some(_admission) = deps.dedup.admit(message_key(&msg)) else {
                log::debug!("Dropping duplicate upload {}", message_key(&msg));
                return Ok(());
            };
            if let Err(e) = handle_upload_message(&bot, &msg, &deps).await {
                log::error!("Upload handling failed in chat {}: {}", msg.chat.id, e);
            }
            Ok(())
        }
    })
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move {
            let Some(_admission) = deps.dedup.admit(message_key(&msg)) else {
                log::debug!("Dropping duplicate message {}", message_key(&msg));
                return Ok(());
            };
            if let Err(e) = handle_unexpected_message(&bot, &msg, &deps).await {
                log::error!("Message handling failed in chat {}: {}", msg.chat.id, e);
            }
            Ok(())
        }
    })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let Some(_admission) = deps.dedup.admit(q.id.0.clone()) else {
                log::debug!("Dropping duplicate callback {}", q.id.0);
                return Ok(());
            };
            if let Err(e) = handle_menu_callback(bot, q, deps.clone()).await {
                log::error!("Callback handling failed: {}", e);
            }
            Ok(())
        }
    })
}
