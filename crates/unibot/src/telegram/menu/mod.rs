//! Inline menus and the role workflows behind them

pub mod attendance;
pub mod callback_router;
pub mod grades;
pub mod helpers;
pub mod keyboards;
pub mod main_menu;
pub mod schedule;
pub mod student;

pub use callback_router::handle_menu_callback;
pub use main_menu::{edit_main_menu, send_main_menu};
