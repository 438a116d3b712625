//! Unicore - core of the campus desk bot
//!
//! Everything that does not need to talk to Telegram lives here, so the
//! import pipeline can be driven from the bot, from the CLI and from tests.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging
//! - `storage`: SQLite pool, migrations and repositories
//! - `import`: CSV structural validation and the transactional importer
//! - `upload`: per-user upload sessions and the debounced upload pipeline
//! - `dedup`: in-flight guard for redelivered events
//! - `callback`: inline button payload codec
//! - `pagination`: slice-and-divide paging for long button lists

pub mod callback;
pub mod core;
pub mod dedup;
pub mod import;
pub mod pagination;
pub mod storage;
pub mod upload;

// Re-export commonly used types for convenience
pub use callback::{CallbackAction, PayloadError};
pub use core::{config, AppError, AppResult};
pub use dedup::{Admission, DedupGuard};
pub use import::{ImportError, ImportSummary, Importer, RecordKind, StructuralError};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
pub use upload::{UploadCoordinator, UploadOutcome, UploadTracker};
