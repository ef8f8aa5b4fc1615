use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::config::SessionSettings;
use crate::core::error::{AppError, AppResult};
use crate::session::SessionId;

/// Where a session is in its lifecycle.
///
/// Terminal states (completed, failed, canceled) are not stored: the session
/// is removed when it reaches one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingTag,
    Downloading,
}

/// One user's in-progress link-to-download flow
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub url: String,
    pub proxy_url: Option<String>,
    pub download_root: PathBuf,
    /// Chosen tag, `None` until the user picks one
    pub tag: Option<String>,
    /// `download_root/tag`, set together with `tag`
    pub destination: Option<PathBuf>,
    pub current_page: usize,
    pub total_pages: usize,
    pub state: SessionState,
    pub created_at: Instant,
    /// Cancelled when the user presses cancel during the download
    pub cancel: CancellationToken,
}

impl Session {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.state == SessionState::AwaitingTag && now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMove {
    Moved(usize),
    /// The request would leave `[0, total_pages)`; the page stays put
    Unchanged(usize),
}

impl PageMove {
    pub fn page(&self) -> usize {
        match self {
            Self::Moved(page) | Self::Unchanged(page) => *page,
        }
    }
}

/// In-memory session table.
///
/// Cheap to clone; clones share the same table. Sessions waiting for a tag
/// expire after the configured TTL, downloading sessions live until the
/// download finishes.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
    ttl: Duration,
    max_sessions: usize,
    total_pages: usize,
}

impl SessionStore {
    /// # Arguments
    /// * `settings` - TTL and capacity
    /// * `total_pages` - page count of the tag keyboard, shared by all sessions
    pub fn new(settings: &SessionSettings, total_pages: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl: settings.ttl(),
            max_sessions: settings.max_sessions.max(1),
            total_pages: total_pages.max(1),
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Opens a session on page 0, waiting for a tag.
    ///
    /// An existing session with the same id is replaced. When the table is
    /// full, expired sessions go first, then the oldest one still waiting
    /// for a tag.
    pub async fn create(
        &self,
        id: SessionId,
        url: impl Into<String>,
        proxy_url: Option<String>,
        download_root: impl Into<PathBuf>,
    ) -> Session {
        let session = Session {
            id,
            url: url.into(),
            proxy_url,
            download_root: download_root.into(),
            tag: None,
            destination: None,
            current_page: 0,
            total_pages: self.total_pages,
            state: SessionState::AwaitingTag,
            created_at: Instant::now(),
            cancel: CancellationToken::new(),
        };

        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&id) {
            log::warn!("Session {} already exists, replacing it", id);
        } else if sessions.len() >= self.max_sessions {
            self.make_room(&mut sessions);
        }
        sessions.insert(id, session.clone());
        log::debug!("Session {} created for {}", id, session.url);
        session
    }

    /// Returns a snapshot of the session.
    ///
    /// # Errors
    /// `AppError::SessionNotFound` if it was removed or has expired.
    pub async fn get(&self, id: &SessionId) -> AppResult<Session> {
        let mut sessions = self.sessions.lock().await;
        self.live_entry(&mut sessions, id).map(|session| session.clone())
    }

    /// Records the tag and moves the session to `Downloading`.
    ///
    /// # Errors
    /// * `AppError::SessionNotFound` - unknown or expired session
    /// * `AppError::Validation` - a download was already started for it
    pub async fn set_tag(&self, id: &SessionId, tag: &str) -> AppResult<Session> {
        let mut sessions = self.sessions.lock().await;
        let session = self.live_entry(&mut sessions, id)?;
        if session.state != SessionState::AwaitingTag {
            return Err(AppError::Validation(format!(
                "session {} is already downloading into {:?}",
                id, session.tag
            )));
        }

        session.destination = Some(session.download_root.join(tag));
        session.tag = Some(tag.to_string());
        session.state = SessionState::Downloading;
        Ok(session.clone())
    }

    /// Moves the current page by `delta`.
    ///
    /// Requests that would leave `[0, total_pages)` are no-ops and report
    /// `PageMove::Unchanged`; so are requests for a session that is already
    /// downloading.
    pub async fn advance_page(&self, id: &SessionId, delta: isize) -> AppResult<PageMove> {
        let mut sessions = self.sessions.lock().await;
        let session = self.live_entry(&mut sessions, id)?;
        let current = session.current_page;

        if session.state != SessionState::AwaitingTag {
            return Ok(PageMove::Unchanged(current));
        }

        match current.checked_add_signed(delta) {
            Some(target) if target < session.total_pages && target != current => {
                session.current_page = target;
                Ok(PageMove::Moved(target))
            }
            _ => Ok(PageMove::Unchanged(current)),
        }
    }

    pub async fn remove(&self, id: &SessionId) -> Option<Session> {
        let removed = self.sessions.lock().await.remove(id);
        if removed.is_some() {
            log::debug!("Session {} removed", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Drops expired sessions, returns how many were dropped
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl, now));
        before - sessions.len()
    }

    /// Runs [`cleanup`](Self::cleanup) every `period` until the runtime shuts down
    pub fn spawn_cleanup_task(self, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let dropped = self.cleanup().await;
                if dropped > 0 {
                    log::info!("Expired {} abandoned session(s)", dropped);
                }
            }
        })
    }

    fn live_entry<'a>(
        &self,
        sessions: &'a mut HashMap<SessionId, Session>,
        id: &SessionId,
    ) -> AppResult<&'a mut Session> {
        let expired = sessions
            .get(id)
            .map(|session| session.is_expired(self.ttl, Instant::now()))
            .ok_or(AppError::SessionNotFound(*id))?;
        if expired {
            sessions.remove(id);
            log::debug!("Session {} expired", id);
            return Err(AppError::SessionNotFound(*id));
        }
        sessions.get_mut(id).ok_or(AppError::SessionNotFound(*id))
    }

    fn make_room(&self, sessions: &mut HashMap<SessionId, Session>) {
        let now = Instant::now();
        sessions.retain(|_, session| !session.is_expired(self.ttl, now));
        if sessions.len() < self.max_sessions {
            return;
        }

        let oldest = sessions
            .values()
            .filter(|session| session.state == SessionState::AwaitingTag)
            .min_by_key(|session| session.created_at)
            .map(|session| session.id);
        match oldest {
            Some(id) => {
                sessions.remove(&id);
                log::warn!("Session table full ({}), evicted {}", self.max_sessions, id);
            }
            None => log::warn!(
                "Session table full ({}) with downloads only, growing past the limit",
                self.max_sessions
            ),
        }
    }
}
