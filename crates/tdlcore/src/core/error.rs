use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionId;

/// Centralized error types for the application
///
/// Everything below the bot adapter reports failures through this enum.
/// A nonzero exit of the downloader is not an error: it is a
/// [`DownloadOutcome::Failed`](crate::download::DownloadOutcome::Failed).
///
/// # Example
///
/// ```no_run
/// use tdlcore::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Config file does not exist (a default one gets generated)
    #[error("Config file not found: {}", .0.display())]
    ConfigMissing(PathBuf),

    /// Config file exists but could not be parsed or merged
    #[error("Config error: {0}")]
    Config(Box<figment::Error>),

    /// Download destination could not be created
    #[error("Failed to create destination {}: {source}", path.display())]
    DestinationCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The downloader binary could not be started
    #[error("Failed to start downloader '{bin}': {source}")]
    SubprocessSpawnFailed {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    /// Callback refers to a session that was removed or never existed
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    /// Callback data that does not follow `<action>#<chat>:<message>:<slot>`
    #[error("Malformed callback data: {0:?}")]
    MalformedCallback(String),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(Box::new(err))
    }
}
