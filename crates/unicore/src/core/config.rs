use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: unibot.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "unibot.sqlite".to_string()));

/// Directory for the log file
/// Read from LOG_DIR environment variable
/// Default: ./logs
pub static LOG_DIR: Lazy<String> = Lazy::new(|| env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()));

/// Log level: error, warn, info, debug, trace
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Staging directory for uploaded CSV files
/// Read from TEMP_FILES_DIR environment variable
/// Default: ./tmp
pub static TEMP_FILES_DIR: Lazy<String> =
    Lazy::new(|| env::var("TEMP_FILES_DIR").unwrap_or_else(|_| "./tmp".to_string()));

/// Telegram user ids that may switch between admin/teacher/student roles
/// Read from SUPER_USER_IDS (comma-separated). Unparseable entries are skipped.
pub static SUPER_USER_IDS: Lazy<Vec<i64>> =
    Lazy::new(|| parse_id_list(&env::var("SUPER_USER_IDS").unwrap_or_default()));

/// Offset applied when rendering stored UTC timestamps to users
/// Read from DISPLAY_UTC_OFFSET_HOURS environment variable
/// Default: 3 (Moscow)
pub static DISPLAY_UTC_OFFSET_HOURS: Lazy<i32> = Lazy::new(|| {
    env::var("DISPLAY_UTC_OFFSET_HOURS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|h: &i32| (-12..=14).contains(h))
        .unwrap_or(3)
});

/// Returns true if `user_id` is configured as a super user
pub fn is_super_user(user_id: i64) -> bool {
    SUPER_USER_IDS.contains(&user_id)
}

fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                log::warn!("Ignoring invalid id in SUPER_USER_IDS: {:?}", s);
                None
            }
        })
        .collect()
}

/// Upload session configuration
pub mod upload {
    use super::Duration;

    /// Window after the first file of a burst during which further files
    /// are counted instead of processed (in milliseconds)
    pub const DEBOUNCE_MS: u64 = 500;

    /// Burst debounce duration
    pub fn debounce() -> Duration {
        Duration::from_millis(DEBOUNCE_MS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout for fetching an uploaded file (in seconds)
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 30;

    /// Request timeout for Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// File download timeout duration
    pub fn download_timeout() -> Duration {
        Duration::from_secs(DOWNLOAD_TIMEOUT_SECS)
    }

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Pagination of long button lists
pub mod pagination {
    /// Students shown per page in the grade entry flow
    pub const STUDENTS_PER_PAGE: usize = 5;
}

/// Grade scale
pub mod grades {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 5;
}
