//! Telegram update handlers
//!
//! - `schema`: dptree dispatcher tree
//! - `commands`: `/help`, `/start`, `/show_config` and link messages
//! - `callbacks`: tag, navigation and cancel buttons
//! - `status`: download status edits

pub mod callbacks;
pub mod commands;
pub mod schema;
pub mod status;
pub mod types;

pub use schema::schema;
pub use status::TelegramStatusSink;
pub use types::{HandlerDeps, HandlerError};
