//! Unibot - Telegram front end of the campus desk bot
//!
//! Storage, import and upload sessions live in `unicore`; this crate wires
//! them to Telegram: the handler tree, menus, role workflows and rendering.

pub mod cli;
pub mod telegram;
