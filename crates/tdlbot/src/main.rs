use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tdlbot::cli::{Cli, Commands};
use tdlbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use tdlcore::config::write_default_config;
use tdlcore::core::logging::LOG_FILE_PATH;
use tdlcore::core::{init_logger, set_verbosity};
use tdlcore::flow::{event_text, finished_text};
use tdlcore::{AppError, BotConfig, DownloadFlow, DownloadOutcome, DownloadRequest, TdlRunner};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the subcommand, `run` by default.
///
/// # Errors
/// Returns an error if initialization fails (logging, config, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenvy::dotenv();

    // Initialize logger (console + file)
    init_logger(Path::new(LOG_FILE_PATH))?;

    match cli.command {
        Some(Commands::InitConfig { force }) => {
            write_default_config(&cli.config, force)?;
            println!("Wrote {}", cli.config.display());
            Ok(())
        }
        Some(Commands::CheckConfig) => {
            if let Some(config) = load_config(&cli.config)? {
                println!("{}", config.summary());
            }
            Ok(())
        }
        Some(Commands::Download { url, tag }) => run_cli_download(&cli.config, url, tag).await,
        Some(Commands::Run) => run_bot(&cli.config).await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(&cli.config).await
        }
    }
}

/// Loads the config and applies its log level.
///
/// A missing file is replaced by the default one and `None` is returned, the
/// operator has to fill in the token before anything can run.
fn load_config(path: &Path) -> Result<Option<BotConfig>> {
    match BotConfig::load(path) {
        Ok(config) => {
            set_verbosity(config.debug);
            Ok(Some(config))
        }
        Err(AppError::ConfigMissing(path)) => {
            write_default_config(&path, false)?;
            log::warn!(
                "No config found, generated {}. Fill in bot_token, download_path and tags, then start again.",
                path.display()
            );
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Runs the bot with long polling until Ctrl-C
async fn run_bot(config_path: &Path) -> Result<()> {
    let Some(config) = load_config(config_path)? else {
        return Ok(());
    };
    let config = Arc::new(config);
    log::info!("Configuration:\n{}", config.summary());

    let bot = create_bot(&config)?;
    let me = bot.get_me().await?;
    log::info!("Bot @{} started", me.username());

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let flow = DownloadFlow::new(Arc::clone(&config))?;
    let cleanup = flow
        .sessions()
        .clone()
        .spawn_cleanup_task(config.session.cleanup_interval());

    let handler = schema(HandlerDeps::new(flow));

    // Create polling listener that drops pending updates on start
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    cleanup.abort();
    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// One-off download from the command line, Ctrl-C cancels it
async fn run_cli_download(config_path: &Path, url: String, tag: String) -> Result<()> {
    let Some(config) = load_config(config_path)? else {
        return Ok(());
    };
    if !config.tags.contains(&tag) {
        anyhow::bail!("Unknown tag {:?}, configured tags: {}", tag, config.tags.join(", "));
    }

    let runner = TdlRunner::new(&config.tdl);
    let request = DownloadRequest {
        url: url.clone(),
        proxy_url: config.proxy_url.clone(),
        destination: config.download_path.join(&tag),
        cancel: CancellationToken::new(),
    };
    println!("Will be downloaded into: {}", request.destination.display());

    let cancel = request.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C received, stopping tdl");
            cancel.cancel();
        }
    });

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let printer = {
        let (url, tag) = (url.clone(), tag.clone());
        tokio::spawn(async move {
            while let Some(event) = progress_rx.recv().await {
                println!("{}", event_text(&url, &tag, &event));
            }
        })
    };

    let outcome = runner.run_with_progress(&request, Some(progress_tx)).await?;
    let _ = printer.await;

    println!("{}", finished_text(&url, &tag, &outcome));
    match outcome {
        DownloadOutcome::Failed { exit_code, .. } => {
            anyhow::bail!("tdl failed with exit code {:?}", exit_code)
        }
        DownloadOutcome::Completed { .. } | DownloadOutcome::Canceled => Ok(()),
    }
}
