//! Inline button presses

use teloxide::prelude::*;
use teloxide::types::{MessageId, ReplyParameters};
use tdlcore::flow::{canceled_text, destination_text};
use tdlcore::session::Session;
use tdlcore::{AppError, AppResult, CallbackReply};

use super::status::TelegramStatusSink;
use super::types::HandlerDeps;
use crate::telegram::keyboard::{cancel_markup, page_markup};

/// Short notice shown to the user for callbacks that cannot be served
fn notice_for(err: &AppError) -> Option<&'static str> {
    match err {
        AppError::SessionNotFound(_) => Some("This request has expired, send the link again."),
        AppError::MalformedCallback(_) => Some("Unknown button."),
        AppError::Validation(_) => Some("Already downloading."),
        _ => None,
    }
}

/// Answers the query, then applies the press to the flow.
///
/// Downloads are spawned so that presses on the same chat (cancel) keep
/// being handled while tdl runs.
pub async fn handle_callback(bot: &Bot, q: CallbackQuery, deps: &HandlerDeps) -> AppResult<()> {
    let data = q.data.clone().unwrap_or_default();

    // Without the prompt message there is nothing to edit, leave the session as it is
    let Some((chat_id, message_id)) = q.message.as_ref().map(|m| (m.chat().id, m.id())) else {
        log::warn!("Callback {:?} has no message attached", data);
        if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
            log::warn!("Failed to answer callback {:?}: {}", data, e);
        }
        return Ok(());
    };

    let result = deps.flow.handle_callback(&data).await;

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(notice) = result.as_ref().err().and_then(notice_for) {
        answer = answer.text(notice);
    }
    if let Err(e) = answer.await {
        log::warn!("Failed to answer callback {:?}: {}", data, e);
    }

    let reply = match result {
        Ok(reply) => reply,
        Err(e) => {
            log::warn!("Ignoring callback {:?}: {}", data, e);
            return Ok(());
        }
    };

    match reply {
        CallbackReply::Page { page, .. } => {
            bot.edit_message_reply_markup(chat_id, message_id)
                .reply_markup(page_markup(&page))
                .await?;
        }
        CallbackReply::PageUnchanged | CallbackReply::CancelRequested => {}
        CallbackReply::Canceled { .. } => {
            bot.edit_message_reply_markup(chat_id, message_id).await?;
            bot.send_message(chat_id, canceled_text())
                .reply_parameters(ReplyParameters::new(message_id))
                .await?;
        }
        CallbackReply::Download { session } => {
            let destination = session.destination.clone().unwrap_or_default();
            let shown = bot
                .edit_message_text(chat_id, message_id, destination_text(&session.url, &destination))
                .reply_markup(cancel_markup(session.id))
                .await;
            // The session is already downloading, it has to run to be released
            if let Err(e) = shown {
                log::warn!("Failed to show destination for session {}: {}", session.id, e);
            }
            spawn_download(bot.clone(), chat_id, message_id, session, deps.clone());
        }
    }
    Ok(())
}

fn spawn_download(bot: Bot, chat_id: ChatId, message_id: MessageId, session: Session, deps: HandlerDeps) {
    tokio::spawn(async move {
        let sink = TelegramStatusSink::new(bot, chat_id, message_id, session.id);
        let outcome = deps.flow.run_download(session, &sink).await;
        log::debug!("Download task finished: {}", outcome.status_line());
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdlcore::SessionId;

    #[test]
    fn test_notice_for_user_facing_errors() {
        assert!(notice_for(&AppError::SessionNotFound(SessionId::new(1, 2, 0))).is_some());
        assert!(notice_for(&AppError::MalformedCallback("x".to_string())).is_some());
        assert!(notice_for(&AppError::Io(std::io::Error::other("disk"))).is_none());
    }
}
