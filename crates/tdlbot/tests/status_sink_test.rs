//! TelegramStatusSink against a mocked Bot API

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{TelegramMock, CHAT_ID, PROMPT_MESSAGE_ID};
use pretty_assertions::assert_eq;
use tdlbot::telegram::TelegramStatusSink;
use tdlcore::{SessionId, StatusSink};
use teloxide::prelude::*;
use teloxide::types::MessageId;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sink(bot: Bot) -> TelegramStatusSink {
    TelegramStatusSink::new(
        bot,
        ChatId(CHAT_ID),
        MessageId(PROMPT_MESSAGE_ID),
        SessionId::new(CHAT_ID, 7, 0),
    )
}

#[tokio::test]
async fn test_progress_keeps_cancel_button_and_finish_drops_it() {
    let mock = TelegramMock::start().await;
    let sink = sink(mock.bot());

    sink.progress("https://t.me/c/1 tag: dog\nDownloading: 10% 1 MB/s".to_string())
        .await;
    sink.finish("https://t.me/c/1 tag: dog\nDownload done! [1 MB]".to_string())
        .await;

    let bodies = mock.bodies("editMessageText").await;
    assert_eq!(bodies.len(), 2);

    assert_eq!(bodies[0]["message_id"], PROMPT_MESSAGE_ID);
    assert_eq!(
        bodies[0]["text"].as_str().unwrap(),
        "https://t.me/c/1 tag: dog\nDownloading: 10% 1 MB/s"
    );
    let button = &bodies[0]["reply_markup"]["inline_keyboard"][0][0];
    assert_eq!(button["callback_data"].as_str().unwrap(), "cancel#123456789:7:0");

    assert_eq!(
        bodies[1]["text"].as_str().unwrap(),
        "https://t.me/c/1 tag: dog\nDownload done! [1 MB]"
    );
    assert!(bodies[1].get("reply_markup").is_none());
}

#[tokio::test]
async fn test_repeated_progress_is_sent_once() {
    let mock = TelegramMock::start().await;
    let sink = sink(mock.bot());

    sink.progress("a".to_string()).await;
    sink.progress("a".to_string()).await;
    sink.progress("b".to_string()).await;
    sink.finish("c".to_string()).await;

    let texts: Vec<String> = mock
        .bodies("editMessageText")
        .await
        .iter()
        .map(|b| b["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_api_errors_are_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message to edit not found"
        })))
        .mount(&server)
        .await;
    let bot = Bot::new("test_token_12345:ABCDEF").set_api_url(server.uri().parse().unwrap());
    let sink = sink(bot);

    sink.progress("a".to_string()).await;
    sink.finish("b".to_string()).await;

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
