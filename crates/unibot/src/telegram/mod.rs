//! Telegram bot integration and handlers

pub mod bot;
pub mod fetch;
pub mod handlers;
pub mod menu;
pub mod notifications;
pub mod render;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use fetch::TelegramFileFetcher;
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use notifications::TelegramNotifier;
pub use teloxide::Bot;
