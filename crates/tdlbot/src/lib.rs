//! tdlbot - Telegram front end for tdl
//!
//! Send a `https://t.me/...` message link to the bot, pick a tag from the
//! inline keyboard and the message's media is downloaded into
//! `download_path/<tag>` by tdl, with progress edited into the chat.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod cli;
pub mod telegram;
