//! Update handlers: commands, uploads, free text and callbacks

mod commands;
pub mod schema;
pub mod types;
mod uploads;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
