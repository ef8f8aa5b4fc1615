//! Common test utilities
//!
//! A wiremock stand-in for the Bot API plus builders for the updates the
//! handlers receive.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tdlbot::telegram::HandlerDeps;
use tdlcore::{BotConfig, DownloadFlow};
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHAT_ID: i64 = 123456789;
pub const PROMPT_MESSAGE_ID: i32 = 42;

/// Bot API mock answering every method the handlers call
pub struct TelegramMock {
    pub server: MockServer,
}

impl TelegramMock {
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path_regex("(?i)/bot[^/]+/answerCallbackQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": true
            })))
            .mount(&server)
            .await;

        for api_method in ["sendMessage", "editMessageText", "editMessageReplyMarkup"] {
            Mock::given(method("POST"))
                .and(path_regex(format!("(?i)/bot[^/]+/{}", api_method)))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "ok": true,
                    "result": bot_message_json(PROMPT_MESSAGE_ID, "ok")
                })))
                .mount(&server)
                .await;
        }

        Self { server }
    }

    pub fn bot(&self) -> Bot {
        Bot::new("test_token_12345:ABCDEF").set_api_url(self.server.uri().parse().unwrap())
    }

    /// `(method, body)` of every request so far, method lowercased
    pub async fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| {
                let api_method = r.url.path().rsplit('/').next().unwrap_or_default().to_lowercase();
                let body = serde_json::from_slice(&r.body).unwrap_or(serde_json::Value::Null);
                (api_method, body)
            })
            .collect()
    }

    /// Bodies of the calls to `api_method` (case-insensitive)
    pub async fn bodies(&self, api_method: &str) -> Vec<serde_json::Value> {
        let api_method = api_method.to_lowercase();
        self.calls()
            .await
            .into_iter()
            .filter(|(m, _)| *m == api_method)
            .map(|(_, body)| body)
            .collect()
    }

    /// Polls until `count` calls to `api_method` were made or two seconds pass
    pub async fn wait_for(&self, api_method: &str, count: usize) -> Vec<serde_json::Value> {
        for _ in 0..40 {
            let bodies = self.bodies(api_method).await;
            if bodies.len() >= count {
                return bodies;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.bodies(api_method).await
    }
}

fn bot_message_json(message_id: i32, text: &str) -> serde_json::Value {
    serde_json::json!({
        "message_id": message_id,
        "date": 1735992000,
        "chat": {
            "id": CHAT_ID,
            "type": "private",
            "first_name": "Test"
        },
        "from": {
            "id": 987654321,
            "is_bot": true,
            "first_name": "TestBot",
            "username": "test_bot"
        },
        "text": text
    })
}

/// Incoming user message
pub fn user_message(message_id: i32, text: &str) -> Message {
    let json = serde_json::json!({
        "message_id": message_id,
        "date": 1735992000,
        "chat": {
            "id": CHAT_ID,
            "type": "private",
            "first_name": "Test"
        },
        "from": {
            "id": 555,
            "is_bot": false,
            "first_name": "Test"
        },
        "text": text
    });
    serde_json::from_value(json).expect("Failed to deserialize message")
}

/// Button press on the bot's prompt message
pub fn callback(data: &str) -> CallbackQuery {
    let json = serde_json::json!({
        "id": "callback_123",
        "from": {
            "id": 555,
            "is_bot": false,
            "first_name": "Test"
        },
        "message": bot_message_json(PROMPT_MESSAGE_ID, "https://t.me/example/1\nchoose tag: "),
        "chat_instance": "chat_instance_123",
        "data": data
    });
    serde_json::from_value(json).expect("Failed to deserialize callback")
}

/// Button press whose message is not available to the bot
pub fn detached_callback(data: &str) -> CallbackQuery {
    let json = serde_json::json!({
        "id": "callback_456",
        "from": {
            "id": 555,
            "is_bot": false,
            "first_name": "Test"
        },
        "inline_message_id": "inline_1",
        "chat_instance": "chat_instance_123",
        "data": data
    });
    serde_json::from_value(json).expect("Failed to deserialize callback")
}

/// Handler deps over a flow with `tags`, a `rows` x `cols` keyboard and `tdl_bin`
pub fn deps(download_path: &Path, tdl_bin: &str, tags: &[&str], rows: usize, cols: usize) -> HandlerDeps {
    let tags = tags
        .iter()
        .map(|tag| format!("{:?}", tag))
        .collect::<Vec<_>>()
        .join(", ");
    let toml = format!(
        r#"
bot_token = "42:token"
download_path = {download:?}
tags = [{tags}]

[keyboard]
rows_per_page = {rows}
cols_per_row = {cols}

[tdl]
bin = {tdl_bin:?}
extra_args = []
progress_interval = 1
"#,
        download = download_path.display().to_string(),
    );
    let config = BotConfig::from_toml_str(&toml).unwrap();
    HandlerDeps::new(DownloadFlow::new(Arc::new(config)).unwrap())
}
