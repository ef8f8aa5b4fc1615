//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation (timeouts, proxy, IPv4 pinning)
//! - Command menu registration

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use indoc::indoc;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;
use tdlcore::BotConfig;

/// Network timeout for Bot API requests, longer than the polling timeout
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(60);

/// Reply to `/help` and `/start`
pub const HELP_TEXT: &str = indoc! {"
    Supported command:
    /help to display help message.
    /show_config to display bot config.

    How to use:
    Send message link to bot and select the tag, the download will be performed automatically."};

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Supported commands:")]
pub enum Command {
    #[command(description = "display help message")]
    Help,
    #[command(description = "display help message")]
    Start,
    #[command(description = "display bot config")]
    ShowConfig,
}

/// Creates a Bot instance from the config
///
/// The proxy from the config is used for Bot API traffic as well. Unless
/// `enable_ipv6` is set the client binds to an IPv4 address. `BOT_API_URL`
/// points the bot at a local Bot API server.
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Invalid proxy or API URL, or the client failed to build
pub fn create_bot(config: &BotConfig) -> anyhow::Result<Bot> {
    let mut builder = ClientBuilder::new().timeout(NETWORK_TIMEOUT);

    if let Some(proxy_url) = config.proxy_url.as_deref() {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| anyhow::anyhow!("Invalid proxy_url: {}", e))?;
        builder = builder.proxy(proxy);
    }
    if !config.enable_ipv6 {
        builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    let bot = Bot::with_client(config.bot_token.expose_secret(), builder.build()?);

    let bot = match std::env::var("BOT_API_URL") {
        Ok(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = reqwest::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        Err(_) => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let commands: Vec<BotCommand> = Command::bot_commands()
        .into_iter()
        .filter(|command| command.command.trim_start_matches('/') != "start")
        .collect();
    bot.set_my_commands(commands).await?;
    Ok(())
}
