//! Command set and bot construction

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use unicore::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу и показать главное меню")]
    Start,
    #[command(description = "показать ваш Telegram ID")]
    Whoami,
    #[command(description = "показать главное меню")]
    Menu,
}

/// Creates a Bot with the configured token and request timeout
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.trim();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN environment variable not set");
    }
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(token, client))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
