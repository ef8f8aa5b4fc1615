//! Download status reported by editing one Telegram message

use std::sync::Mutex;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tdlcore::{SessionId, StatusSink};

use crate::telegram::keyboard::cancel_markup;

/// Edits the "Will be downloaded into" message in place.
///
/// Progress edits keep a cancel button; the final edit removes it.
/// Identical consecutive progress texts are sent once, Telegram rejects
/// edits that change nothing.
pub struct TelegramStatusSink {
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    session_id: SessionId,
    last_text: Mutex<Option<String>>,
}

impl TelegramStatusSink {
    pub fn new(bot: Bot, chat_id: ChatId, message_id: MessageId, session_id: SessionId) -> Self {
        Self {
            bot,
            chat_id,
            message_id,
            session_id,
            last_text: Mutex::new(None),
        }
    }

    /// Records `text` as shown; false if it already was
    fn remember(&self, text: &str) -> bool {
        match self.last_text.lock() {
            Ok(mut last) => {
                if last.as_deref() == Some(text) {
                    return false;
                }
                *last = Some(text.to_string());
                true
            }
            Err(_) => true,
        }
    }
}

#[async_trait]
impl StatusSink for TelegramStatusSink {
    async fn progress(&self, text: String) {
        if !self.remember(&text) {
            return;
        }
        let result = self
            .bot
            .edit_message_text(self.chat_id, self.message_id, text)
            .reply_markup(cancel_markup(self.session_id))
            .await;
        if let Err(e) = result {
            log::warn!("Failed to update status of session {}: {}", self.session_id, e);
        }
    }

    async fn finish(&self, text: String) {
        self.remember(&text);
        if let Err(e) = self.bot.edit_message_text(self.chat_id, self.message_id, text).await {
            log::error!("Failed to send final status of session {}: {}", self.session_id, e);
        }
    }
}
