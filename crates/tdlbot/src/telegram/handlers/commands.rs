//! Command and link message handlers

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tdlcore::flow::prompt_text;
use tdlcore::{AppResult, SessionId};

use super::types::HandlerDeps;
use crate::telegram::bot::{Command, HELP_TEXT};
use crate::telegram::keyboard::page_markup;

pub async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> AppResult<()> {
    match cmd {
        Command::Help | Command::Start => {
            bot.send_message(msg.chat.id, HELP_TEXT)
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
        }
        Command::ShowConfig => {
            bot.send_message(msg.chat.id, deps.flow.config().summary()).await?;
        }
    }
    Ok(())
}

/// Replies with a tag keyboard to every link in the message.
///
/// Each link gets its own session, keyed by its position in the message.
pub async fn handle_links(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let links = deps.flow.extract_links(text);
    if links.is_empty() {
        log::debug!("No links in message {} from chat {}", msg.id.0, msg.chat.id);
        return Ok(());
    }

    for (slot, link) in links.into_iter().enumerate() {
        let Ok(slot) = u16::try_from(slot) else {
            log::warn!("Too many links in message {}, ignoring the rest", msg.id.0);
            break;
        };
        let session_id = SessionId::new(msg.chat.id.0, msg.id.0, slot);
        let (_, page) = deps.flow.open_session(session_id, link).await?;

        bot.send_message(msg.chat.id, prompt_text(link))
            .reply_parameters(ReplyParameters::new(msg.id))
            .reply_markup(page_markup(&page))
            .await?;
    }
    Ok(())
}
