//! SQLite pool, migrations and repositories

pub mod attendance;
pub mod catalog;
pub mod db;
pub mod grades;
pub mod migrations;
pub mod schedule;
pub mod users;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
pub use users::{Role, User};
