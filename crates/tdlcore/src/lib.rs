//! tdlcore - download sessions for the tdl Telegram bot
//!
//! Everything that does not need a Telegram connection lives here, so the
//! bot binary is a thin adapter on top.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors and logging
//! - `session`: session store and callback payload codec
//! - `pagination`: tag keyboard pages
//! - `download`: tdl runner and output parsing
//! - `flow`: the link -> tag -> download state machine

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod core;
pub mod download;
pub mod flow;
pub mod pagination;
pub mod session;

// Re-export commonly used types for convenience
pub use self::core::{config, AppError, AppResult, BotConfig};
pub use download::{DownloadOutcome, DownloadRequest, TdlRunner};
pub use flow::{CallbackReply, DownloadFlow, StatusSink};
pub use pagination::{Page, PageLayout};
pub use session::{SessionId, SessionStore};
