//! Logging initialization
//!
//! Console + file output through `simplelog`; every module logs through the
//! `log` facade macros.

use anyhow::{Context, Result};
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the log file created inside the log directory
pub const LOG_FILE_NAME: &str = "unibot.log";

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_dir` - Directory for the log file, created if missing
/// * `level` - Level name (`error`, `warn`, `info`, `debug`, `trace`); unknown names fall back to `info`
///
/// # Returns
/// Path of the log file being written
pub fn init_logger(log_dir: &str, level: &str) -> Result<PathBuf> {
    fs_err::create_dir_all(log_dir).context("create log directory")?;
    let log_path = Path::new(log_dir).join(LOG_FILE_NAME);

    let log_file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("open log file")?;

    let level = parse_level(level);

    CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), log_file.into_parts().0),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(log_path)
}

fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level.trim()).unwrap_or_else(|_| {
        eprintln!("Unknown LOG_LEVEL {:?}, using info", level);
        LevelFilter::Info
    })
}
