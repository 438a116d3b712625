use anyhow::Result;
use dotenvy::dotenv;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use unibot::cli::{Cli, Commands};
use unibot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramFileFetcher, TelegramNotifier};
use unicore::core::init_logger;
use unicore::import::{import_file, Importer};
use unicore::{config, create_pool, DedupGuard, RecordKind, UploadCoordinator};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the subcommand; no subcommand runs the bot.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Keep the process alive and logged if a handler panics
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // .env before the logger: LOG_DIR and LOG_LEVEL may come from it
    let _ = dotenv();
    let log_file = init_logger(&config::LOG_DIR, &config::LOG_LEVEL)?;
    log::info!("Logging to {}", log_file.display());

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Import { kind, file }) => run_import(kind, &file),
        Some(Commands::Migrate) => run_migrate(),
    }
}

fn run_migrate() -> Result<()> {
    create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to migrate database: {}", e))?;
    log::info!("Database {} is up to date", config::DATABASE_PATH.as_str());
    Ok(())
}

/// Offline import through the same validator and importer the bot uses
fn run_import(kind: RecordKind, file: &Path) -> Result<()> {
    let pool = create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let importer = Importer::new(pool);
    let summary = import_file(&importer, file, kind).map_err(|e| anyhow::anyhow!("Import of {} failed: {}", file.display(), e))?;
    println!("Imported {} {} rows from {}", summary.rows, summary.kind, file.display());
    Ok(())
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");

    let pool = create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let db_pool = Arc::new(pool.clone());

    fs_err::create_dir_all(config::TEMP_FILES_DIR.as_str())?;

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let fetcher = Arc::new(TelegramFileFetcher::new(bot.clone(), config::TEMP_FILES_DIR.as_str())?);
    let notifier = Arc::new(TelegramNotifier::new(bot.clone(), Arc::clone(&db_pool)));
    let uploads = UploadCoordinator::new(pool, fetcher, notifier);
    let dedup = DedupGuard::new();

    let deps = HandlerDeps::new(Arc::clone(&db_pool), dedup.clone(), uploads.clone());
    let handler = schema(deps);

    log::info!(
        "Bot is running ({} super user(s) configured)",
        config::SUPER_USER_IDS.len()
    );
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher stopped, waiting for in-flight uploads");
    dedup.close();
    uploads.shutdown().await;
    log::info!("Shutdown complete");
    Ok(())
}
