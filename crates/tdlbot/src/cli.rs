use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tdlcore::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "tdlbot")]
#[command(author, version, about = "Telegram bot that downloads message links with tdl", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (default)
    Run,

    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Load and validate the config, then print it
    CheckConfig,

    /// Download a single link without Telegram, printing progress
    Download {
        /// Message link, e.g. https://t.me/channel/123
        #[arg(short, long)]
        url: String,

        /// Tag (sub-directory of download_path) to save into
        #[arg(short, long)]
        tag: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
