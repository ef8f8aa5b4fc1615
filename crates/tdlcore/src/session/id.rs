use std::fmt;
use std::str::FromStr;

use crate::core::error::AppError;

/// Identifies one link-to-download flow.
///
/// Telegram message ids are only unique within a chat, and one message can
/// carry several links, so the id combines all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub chat_id: i64,
    pub message_id: i32,
    /// Index of the link within the originating message
    pub slot: u16,
}

impl SessionId {
    pub const fn new(chat_id: i64, message_id: i32, slot: u16) -> Self {
        Self {
            chat_id,
            message_id,
            slot,
        }
    }
}

/// Encoded as `<chat>:<message>:<slot>`
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.chat_id, self.message_id, self.slot)
    }
}

impl FromStr for SessionId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AppError::MalformedCallback(s.to_string());

        let mut fields = s.split(':');
        let (Some(chat), Some(message), Some(slot), None) = (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };

        Ok(Self {
            chat_id: chat.parse().map_err(|_| malformed())?,
            message_id: message.parse().map_err(|_| malformed())?,
            slot: slot.parse().map_err(|_| malformed())?,
        })
    }
}
