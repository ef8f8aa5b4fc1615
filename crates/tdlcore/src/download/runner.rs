//! Runs the `tdl` binary for one session
//!
//! One invocation per download: the destination is created, tdl is spawned
//! with stdout and stderr sharing one pipe, progress is parsed and throttled,
//! and the exit status becomes a [`DownloadOutcome`].
//! A process-wide semaphore bounds how many tdl processes run at once.

use std::ffi::OsString;
use std::io::{self, PipeReader};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::config::TdlSettings;
use crate::core::error::{AppError, AppResult};
use crate::download::progress::{parse_line, strip_ansi, ProgressEvent, ProgressLine, ProgressThrottle};
use crate::session::Session;

/// Everything the runner needs to fetch one link
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub proxy_url: Option<String>,
    pub destination: PathBuf,
    pub cancel: CancellationToken,
}

impl DownloadRequest {
    /// # Errors
    /// `AppError::Validation` when no tag has been chosen for the session yet.
    pub fn from_session(session: &Session) -> AppResult<Self> {
        let destination = session
            .destination
            .clone()
            .ok_or_else(|| AppError::Validation(format!("session {} has no destination yet", session.id)))?;
        Ok(Self {
            url: session.url.clone(),
            proxy_url: session.proxy_url.clone(),
            destination,
            cancel: session.cancel.clone(),
        })
    }
}

/// How a tdl invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Exit code 0; `status` is the last `done!` text or progress status
    Completed { status: String },
    /// Nonzero exit or timeout; `diagnostic` is tdl's last output line
    Failed { exit_code: Option<i32>, diagnostic: String },
    Canceled,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn status_line(&self) -> &str {
        match self {
            Self::Completed { status } => status,
            Self::Failed { diagnostic, .. } => diagnostic,
            Self::Canceled => "Canceled",
        }
    }
}

/// Spawns tdl, shared by every session.
///
/// Cheap to clone; clones share the concurrency limit.
#[derive(Clone)]
pub struct TdlRunner {
    settings: TdlSettings,
    permits: Arc<Semaphore>,
}

impl TdlRunner {
    pub fn new(settings: &TdlSettings) -> Self {
        Self {
            settings: settings.clone(),
            permits: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
        }
    }

    /// `download --url <url> [--proxy <proxy>] --dir <destination> <extra args>`
    pub fn build_args(&self, request: &DownloadRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["download".into(), "--url".into(), request.url.clone().into()];
        if let Some(proxy) = request.proxy_url.as_deref() {
            args.push("--proxy".into());
            args.push(proxy.into());
        }
        args.push("--dir".into());
        args.push(request.destination.clone().into_os_string());
        args.extend(self.settings.extra_args.iter().map(OsString::from));
        args
    }

    pub async fn run(&self, request: &DownloadRequest) -> AppResult<DownloadOutcome> {
        self.run_with_progress(request, None).await
    }

    /// Runs tdl to completion, sending throttled progress to `progress_tx`.
    ///
    /// Waits for a free slot first; cancelling the request while waiting
    /// gives `Canceled` without spawning anything.
    ///
    /// # Errors
    /// * `AppError::DestinationCreateFailed` - checked before spawning
    /// * `AppError::SubprocessSpawnFailed` - the binary could not be started
    /// * `AppError::Io` - waiting on or killing the child failed
    pub async fn run_with_progress(
        &self,
        request: &DownloadRequest,
        progress_tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    ) -> AppResult<DownloadOutcome> {
        let _permit = tokio::select! {
            biased;
            _ = request.cancel.cancelled() => {
                log::info!("Download of {} canceled before it started", request.url);
                return Ok(DownloadOutcome::Canceled);
            }
            permit = self.permits.acquire() => permit
                .map_err(|_| AppError::Validation("download runner is closed".to_string()))?,
        };

        fs_err::tokio::create_dir_all(&request.destination)
            .await
            .map_err(|source| AppError::DestinationCreateFailed {
                path: request.destination.clone(),
                source,
            })?;

        let args = self.build_args(request);
        log::info!("Downloading {} into {}", request.url, request.destination.display());

        // One pipe for both streams keeps stdout and stderr in write order
        let (output, writer) = std::io::pipe()?;
        let mut child = Command::new(&self.settings.bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(writer.try_clone()?))
            .stderr(Stdio::from(writer))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AppError::SubprocessSpawnFailed {
                bin: self.settings.bin.clone(),
                source,
            })?;

        let (line_tx, mut line_rx) = mpsc::unbounded_channel();
        let pump = spawn_pump(output, line_tx)?;

        let deadline = self.settings.timeout().map(|timeout| Instant::now() + timeout);
        let mut tracker = OutputTracker::new(self.settings.progress_interval, progress_tx);

        // Output first: the pipe closes when tdl exits
        let interrupted = loop {
            tokio::select! {
                biased;
                _ = request.cancel.cancelled() => break Some(Interrupt::Canceled),
                _ = deadline_reached(deadline) => break Some(Interrupt::TimedOut),
                line = line_rx.recv() => match line {
                    Some(line) => tracker.observe(&line),
                    None => break None,
                },
            }
        };

        let interrupted = match interrupted {
            Some(interrupt) => interrupt,
            None => {
                tokio::select! {
                    biased;
                    _ = request.cancel.cancelled() => Interrupt::Canceled,
                    _ = deadline_reached(deadline) => Interrupt::TimedOut,
                    status = child.wait() => return Ok(tracker.finish(status?, &self.settings.bin)),
                }
            }
        };

        kill_and_drain(&mut child, &mut line_rx, pump).await?;
        Ok(match interrupted {
            Interrupt::Canceled => {
                log::info!("Download of {} canceled", request.url);
                DownloadOutcome::Canceled
            }
            Interrupt::TimedOut => {
                let secs = self.settings.timeout_secs;
                log::error!("{} timed out after {}s, killed", self.settings.bin, secs);
                DownloadOutcome::Failed {
                    exit_code: None,
                    diagnostic: format!("timed out after {}s", secs),
                }
            }
        })
    }
}

enum Interrupt {
    Canceled,
    TimedOut,
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Reads tdl's output pipe on the runtime.
#[cfg(unix)]
fn spawn_pump(output: PipeReader, tx: mpsc::UnboundedSender<String>) -> io::Result<JoinHandle<()>> {
    let output = tokio::net::unix::pipe::Receiver::from_owned_fd(output.into())?;
    Ok(tokio::spawn(pump_lines(output, tx)))
}

/// No async anonymous pipes here, read on the blocking pool instead.
#[cfg(not(unix))]
fn spawn_pump(output: PipeReader, tx: mpsc::UnboundedSender<String>) -> io::Result<JoinHandle<()>> {
    use std::io::BufRead;

    Ok(tokio::task::spawn_blocking(move || {
        let mut reader = std::io::BufReader::new(output);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if !send_lines(&buf, &tx) {
                        return;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read tdl output: {}", e);
                    break;
                }
            }
        }
    }))
}

/// Forwards every line of `reader` into `tx` until the pipe closes.
#[cfg_attr(not(unix), allow(dead_code))]
async fn pump_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if !send_lines(&buf, &tx) {
                    return;
                }
            }
            Err(e) => {
                log::warn!("Failed to read tdl output: {}", e);
                break;
            }
        }
    }
}

/// Splits one read into lines; false once the receiver is gone.
///
/// tdl redraws its progress table with carriage returns, so `\r` ends a line
/// as well as `\n`.
fn send_lines(chunk: &[u8], tx: &mpsc::UnboundedSender<String>) -> bool {
    String::from_utf8_lossy(chunk)
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .all(|line| tx.send(line.to_string()).is_ok())
}

async fn kill_and_drain(
    child: &mut Child,
    line_rx: &mut mpsc::UnboundedReceiver<String>,
    pump: JoinHandle<()>,
) -> AppResult<()> {
    if let Err(e) = child.kill().await {
        // Already exited between the last read and the kill
        log::debug!("Failed to kill tdl: {}", e);
        child.wait().await?;
    }
    pump.abort();
    while let Ok(line) = line_rx.try_recv() {
        log::warn!("tdl output after kill: {}", strip_ansi(&line).trim_end());
    }
    Ok(())
}

/// Remembers what the outcome will be built from
struct OutputTracker {
    throttle: ProgressThrottle,
    progress_tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    last_done: Option<String>,
    last_status: Option<String>,
    last_line: Option<String>,
}

impl OutputTracker {
    fn new(progress_interval: usize, progress_tx: Option<mpsc::UnboundedSender<ProgressEvent>>) -> Self {
        Self {
            throttle: ProgressThrottle::new(progress_interval),
            progress_tx,
            last_done: None,
            last_status: None,
            last_line: None,
        }
    }

    fn observe(&mut self, raw: &str) {
        let stripped = strip_ansi(raw);
        if !stripped.trim().is_empty() {
            self.last_line = Some(stripped.trim_end().to_string());
        }

        match parse_line(raw) {
            ProgressLine::Done(text) => {
                log::info!("tdl: {}", text);
                self.last_done = Some(text.clone());
                self.send(ProgressEvent::Done(text));
            }
            ProgressLine::Progress(status) => {
                self.last_status = Some(status.to_string());
                if self.throttle.tick() {
                    self.send(ProgressEvent::Progress(status));
                }
            }
            ProgressLine::Noise => {}
            ProgressLine::Unknown(line) => log::debug!("tdl: {}", line),
        }
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.progress_tx {
            // Receiver gone means nobody is watching anymore
            let _ = tx.send(event);
        }
    }

    fn finish(self, status: ExitStatus, bin: &str) -> DownloadOutcome {
        if status.success() {
            let status = self
                .last_done
                .or(self.last_status)
                .unwrap_or_else(|| "done".to_string());
            return DownloadOutcome::Completed { status };
        }

        log::warn!("{} exited with {}", bin, status);
        DownloadOutcome::Failed {
            exit_code: status.code(),
            diagnostic: self.last_line.unwrap_or_else(|| format!("{} exited with {}", bin, status)),
        }
    }
}
