//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::callbacks::handle_callback;
use super::commands::{handle_command, handle_links};
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;

/// Creates the dispatcher schema for the bot.
///
/// Commands first, then plain text (links), then button presses. Errors are
/// logged here and never reach the dispatcher, one bad update must not stop
/// the others.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command {:?} from chat {}", cmd, msg.chat.id);
                if let Err(e) = handle_command(&bot, &msg, cmd, &deps).await {
                    log::error!("Command handler failed for chat {}: {}", msg.chat.id, e);
                }
                Ok::<(), HandlerError>(())
            }
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_links(&bot, &msg, &deps).await {
                    log::error!("Link handler failed for message {} in chat {}: {}", msg.id.0, msg.chat.id, e);
                }
                Ok::<(), HandlerError>(())
            }
        })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let query_id = q.id.clone();
            if let Err(e) = handle_callback(&bot, q, &deps).await {
                log::error!("Callback handler failed for query {:?}: {}", query_id, e);
            }
            Ok::<(), HandlerError>(())
        }
    })
}
