//! Inline button payload codec
//!
//! Payloads are flat `:`-joined token strings; the first token selects the
//! category and the rest are positional parameters.

pub mod payload;

pub use payload::{CallbackAction, MenuTarget, PayloadError, DELIMITER};
