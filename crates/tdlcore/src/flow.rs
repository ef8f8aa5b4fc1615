//! Link -> tag -> download state machine
//!
//! [`DownloadFlow`] ties the session store, the tag keyboard and the tdl
//! runner together without knowing anything about Telegram. The bot adapter
//! turns incoming updates into calls on it and renders what comes back.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::config::BotConfig;
use crate::core::error::{AppError, AppResult};
use crate::download::{DownloadOutcome, DownloadRequest, ProgressEvent, ProgressStatus, TdlRunner};
use crate::pagination::{page_at, page_count, Page, PageLayout};
use crate::session::{CallbackAction, CallbackPayload, PageMove, Session, SessionId, SessionState, SessionStore};

/// Receives the status updates of one download.
///
/// `progress` may be called any number of times, `finish` exactly once.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn progress(&self, text: String);
    async fn finish(&self, text: String);
}

/// What the adapter should do after a button press
#[derive(Debug, Clone)]
pub enum CallbackReply {
    /// Navigation moved, show `page`
    Page { session: Session, page: Page },
    /// Navigation hit a boundary, nothing to redraw
    PageUnchanged,
    /// The tag prompt was dismissed, the session is gone
    Canceled { session: Session },
    /// The running download was told to stop; it reports `Canceled` itself
    CancelRequested,
    /// A tag was chosen, start the download
    Download { session: Session },
}

#[derive(Clone)]
pub struct DownloadFlow {
    config: Arc<BotConfig>,
    sessions: SessionStore,
    runner: TdlRunner,
    layout: PageLayout,
}

impl DownloadFlow {
    pub fn new(config: Arc<BotConfig>) -> AppResult<Self> {
        let layout = config.keyboard.layout()?;
        let total_pages = page_count(config.tags.len(), layout);
        let sessions = SessionStore::new(&config.session, total_pages);
        let runner = TdlRunner::new(&config.tdl);

        log::info!(
            "{} tag(s) on {} page(s) of {}x{}",
            config.tags.len(),
            total_pages,
            layout.rows_per_page(),
            layout.cols_per_row()
        );

        Ok(Self {
            config,
            sessions,
            runner,
            layout,
        })
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn runner(&self) -> &TdlRunner {
        &self.runner
    }

    /// Whitespace-separated words starting with the configured link prefix
    pub fn extract_links<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_whitespace()
            .filter(|word| word.starts_with(self.config.link_prefix.as_str()))
            .collect()
    }

    /// Opens a session for `url` and returns it with its first page.
    pub async fn open_session(&self, id: SessionId, url: &str) -> AppResult<(Session, Page)> {
        let session = self
            .sessions
            .create(id, url, self.config.proxy_url.clone(), self.config.download_path.clone())
            .await;
        let page = self.render_page(&session)?;
        Ok((session, page))
    }

    /// Keyboard for the session's current page
    pub fn render_page(&self, session: &Session) -> AppResult<Page> {
        page_at(&self.config.tags, self.layout, session.id, session.current_page).ok_or_else(|| {
            AppError::Validation(format!(
                "page {} out of range for session {}",
                session.current_page, session.id
            ))
        })
    }

    /// Applies one button press.
    ///
    /// # Errors
    /// * `AppError::MalformedCallback` - undecodable data or a tag index past the list
    /// * `AppError::SessionNotFound` - the session expired or already finished
    /// * `AppError::Validation` - a second tag was picked for a running download
    pub async fn handle_callback(&self, data: &str) -> AppResult<CallbackReply> {
        let CallbackPayload { action, session_id } = CallbackPayload::decode(data)?;

        match action {
            CallbackAction::Prev | CallbackAction::Next => {
                let delta = action.page_delta().unwrap_or_default();
                match self.sessions.advance_page(&session_id, delta).await? {
                    PageMove::Moved(_) => {
                        let session = self.sessions.get(&session_id).await?;
                        let page = self.render_page(&session)?;
                        Ok(CallbackReply::Page { session, page })
                    }
                    PageMove::Unchanged(_) => Ok(CallbackReply::PageUnchanged),
                }
            }
            CallbackAction::Cancel => {
                let session = self.sessions.get(&session_id).await?;
                match session.state {
                    SessionState::AwaitingTag => {
                        self.sessions.remove(&session_id).await;
                        log::info!("Session {} canceled before download", session_id);
                        Ok(CallbackReply::Canceled { session })
                    }
                    SessionState::Downloading => {
                        log::info!("Cancel requested for session {}", session_id);
                        session.cancel.cancel();
                        Ok(CallbackReply::CancelRequested)
                    }
                }
            }
            CallbackAction::Tag(index) => {
                let tag = self
                    .config
                    .tags
                    .get(index)
                    .ok_or_else(|| AppError::MalformedCallback(data.to_string()))?;
                let session = self.sessions.set_tag(&session_id, tag).await?;
                log::info!("Session {}: {} -> {}", session_id, session.url, tag);
                Ok(CallbackReply::Download { session })
            }
        }
    }

    /// Runs the download for a session that has a tag.
    ///
    /// Progress goes to `sink.progress`, the terminal message to
    /// `sink.finish`. The session is removed whatever the outcome.
    pub async fn run_download(&self, session: Session, sink: &dyn StatusSink) -> DownloadOutcome {
        let tag = session.tag.clone().unwrap_or_default();
        let outcome = match DownloadRequest::from_session(&session) {
            Ok(request) => self.run_forwarding(&request, &session.url, &tag, sink).await,
            Err(e) => Err(e),
        };

        let outcome = outcome.unwrap_or_else(|e| {
            log::error!("Download of {} failed to start: {}", session.url, e);
            DownloadOutcome::Failed {
                exit_code: None,
                diagnostic: e.to_string(),
            }
        });

        self.sessions.remove(&session.id).await;
        match &outcome {
            DownloadOutcome::Completed { status } => log::info!("Downloaded {} ({})", session.url, status),
            DownloadOutcome::Failed { exit_code, diagnostic } => {
                log::warn!("Download of {} failed ({:?}): {}", session.url, exit_code, diagnostic)
            }
            DownloadOutcome::Canceled => log::info!("Download of {} canceled", session.url),
        }
        sink.finish(finished_text(&session.url, &tag, &outcome)).await;
        outcome
    }

    async fn run_forwarding(
        &self,
        request: &DownloadRequest,
        url: &str,
        tag: &str,
        sink: &dyn StatusSink,
    ) -> AppResult<DownloadOutcome> {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();

        let forward = async {
            while let Some(event) = progress_rx.recv().await {
                sink.progress(event_text(url, tag, &event)).await;
            }
        };
        let (outcome, ()) = tokio::join!(self.runner.run_with_progress(request, Some(progress_tx)), forward);
        outcome
    }
}

/// Reply to a link
pub fn prompt_text(url: &str) -> String {
    format!("{}\nchoose tag: ", url)
}

/// First status after a tag was picked
pub fn destination_text(url: &str, destination: &Path) -> String {
    format!("{}\nWill be downloaded into: {}", url, destination.display())
}

pub fn progress_text(url: &str, tag: &str, status: &ProgressStatus) -> String {
    format!("{} tag: {}\nDownloading: {}", url, tag, status)
}

pub fn canceled_text() -> &'static str {
    "Canceled"
}

pub fn finished_text(url: &str, tag: &str, outcome: &DownloadOutcome) -> String {
    match outcome {
        DownloadOutcome::Completed { status } => format!("{} tag: {}\nDownload {}", url, tag, status),
        DownloadOutcome::Failed { diagnostic, .. } => {
            format!("{} tag: {}\nDownload failed: {}", url, tag, diagnostic)
        }
        DownloadOutcome::Canceled => format!("{} tag: {}\n{}", url, tag, canceled_text()),
    }
}

/// Status text for one runner event
pub fn event_text(url: &str, tag: &str, event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Progress(status) => progress_text(url, tag, status),
        ProgressEvent::Done(text) => format!("{} tag: {}\nDownload {}", url, tag, text),
    }
}
