use clap::{Parser, Subcommand};
use std::path::PathBuf;
use unicore::RecordKind;

#[derive(Parser, Debug)]
#[command(name = "unibot")]
#[command(author, version, about = "Telegram bot for university rosters, schedules, grades and attendance", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Validate and import a CSV file without the bot
    Import {
        /// What the file contains: students, teachers or schedule
        #[arg(short, long, value_parser = parse_kind)]
        kind: RecordKind,

        /// Path to the CSV file
        file: PathBuf,
    },

    /// Apply database migrations and exit
    Migrate,
}

fn parse_kind(raw: &str) -> Result<RecordKind, String> {
    raw.parse::<RecordKind>()
        .map_err(|_| format!("unknown kind {:?}, expected students, teachers or schedule", raw))
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
