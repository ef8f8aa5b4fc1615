//! Inline button payloads
//!
//! Telegram delivers callback queries without any session context, so every
//! button carries both what was pressed and which session it belongs to:
//! `<action>#<chat>:<message>:<slot>`, e.g. `tag:3#-100123:45:0` or
//! `next#-100123:45:0`.

use std::fmt;
use std::str::FromStr;

use crate::core::error::{AppError, AppResult};
use crate::session::SessionId;

/// Separates the action from the session id
pub const PAYLOAD_SEPARATOR: char = '#';

/// Telegram rejects `callback_data` longer than this (in bytes)
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

const TAG_PREFIX: &str = "tag:";

/// What a button does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Select the tag at this index of the configured tag list
    Tag(usize),
    Prev,
    Next,
    Cancel,
}

impl CallbackAction {
    /// Page offset for navigation buttons
    pub fn page_delta(&self) -> Option<isize> {
        match self {
            Self::Prev => Some(-1),
            Self::Next => Some(1),
            Self::Tag(_) | Self::Cancel => None,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(index) => write!(f, "{}{}", TAG_PREFIX, index),
            Self::Prev => f.write_str("prev"),
            Self::Next => f.write_str("next"),
            Self::Cancel => f.write_str("cancel"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prev" => Ok(Self::Prev),
            "next" => Ok(Self::Next),
            "cancel" => Ok(Self::Cancel),
            _ => s
                .strip_prefix(TAG_PREFIX)
                .and_then(|index| index.parse().ok())
                .map(Self::Tag)
                .ok_or_else(|| AppError::MalformedCallback(s.to_string())),
        }
    }
}

/// Decoded `callback_data` of one button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackPayload {
    pub action: CallbackAction,
    pub session_id: SessionId,
}

impl CallbackPayload {
    pub const fn new(action: CallbackAction, session_id: SessionId) -> Self {
        Self { action, session_id }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parses `<action>#<session-id>`.
    ///
    /// # Errors
    /// `AppError::MalformedCallback` unless there is exactly one separator, a
    /// known action and a three-field numeric session id.
    pub fn decode(data: &str) -> AppResult<Self> {
        if data.len() > MAX_CALLBACK_DATA_LEN {
            return Err(AppError::MalformedCallback(data.to_string()));
        }

        let mut parts = data.split(PAYLOAD_SEPARATOR);
        let (Some(action), Some(session_id), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AppError::MalformedCallback(data.to_string()));
        };

        let malformed = |_| AppError::MalformedCallback(data.to_string());
        Ok(Self {
            action: action.parse().map_err(malformed)?,
            session_id: session_id.parse().map_err(malformed)?,
        })
    }
}

impl fmt::Display for CallbackPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.action, PAYLOAD_SEPARATOR, self.session_id)
    }
}

impl FromStr for CallbackPayload {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
