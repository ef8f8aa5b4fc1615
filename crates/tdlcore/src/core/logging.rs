//! Logging initialization
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Size-based rotation of the log file, at startup and while running
//! - Switching between info and debug verbosity once the config is known

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};

/// Log file written to the working directory
pub const LOG_FILE_PATH: &str = "tdl_bot.log";

/// Rotate the log file once it grows past this size
pub const MAX_LOG_BYTES: u64 = 1024 * 1024;

/// Number of rotated files kept (`tdl_bot.log.1` .. `tdl_bot.log.3`)
pub const LOG_BACKUPS: usize = 3;

/// Initialize logger for both console and file output
///
/// The sinks are built at debug level and the global max level starts at
/// info; call [`set_verbosity`] after the config is loaded.
///
/// # Arguments
/// * `log_file_path` - Path to the log file (appended to, rotated when large)
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to open the file or install the logger
pub fn init_logger(log_file_path: &Path) -> Result<()> {
    let rotation = rotate_log_file(log_file_path, MAX_LOG_BYTES, LOG_BACKUPS);

    let log_file = RotatingLogFile::open(log_file_path, MAX_LOG_BYTES, LOG_BACKUPS)
        .map_err(|e| anyhow::anyhow!("Failed to open log file: {}", e))?;

    let config = ConfigBuilder::new()
        .set_location_level(LevelFilter::Debug)
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Debug,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Debug, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    set_verbosity(false);

    match rotation {
        Ok(true) => log::info!("Rotated {} (larger than {} bytes)", log_file_path.display(), MAX_LOG_BYTES),
        Ok(false) => {}
        Err(e) => log::warn!("Failed to rotate {}: {}", log_file_path.display(), e),
    }

    Ok(())
}

/// Switches the global level between debug and info
pub fn set_verbosity(debug: bool) {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    log::set_max_level(level);
    log::info!("logging level: {}", level);
}

/// Shifts `path` to `path.1`, `path.1` to `path.2` and so on when `path` is
/// larger than `max_bytes`. The oldest backup beyond `backups` is dropped.
///
/// Returns `Ok(true)` when a rotation happened.
pub fn rotate_log_file(path: &Path, max_bytes: u64, backups: usize) -> io::Result<bool> {
    let size = match fs_err::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size <= max_bytes {
        return Ok(false);
    }
    shift_backups(path, backups)?;
    Ok(true)
}

/// Moves `path` to `path.1` after shifting the older backups up by one
fn shift_backups(path: &Path, backups: usize) -> io::Result<()> {
    if backups == 0 {
        return fs_err::remove_file(path);
    }

    let oldest = backup_path(path, backups);
    if oldest.exists() {
        fs_err::remove_file(&oldest)?;
    }
    for index in (1..backups).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            fs_err::rename(&from, backup_path(path, index + 1))?;
        }
    }
    fs_err::rename(path, backup_path(path, 1))
}

/// Append-only log file that rotates itself once it grows past `max_bytes`.
///
/// A failed rotation keeps writing to the current file.
pub struct RotatingLogFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: fs_err::File,
    written: u64,
}

impl RotatingLogFile {
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let file = open_append(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        shift_backups(&self.path, self.backups)?;
        self.file = open_append(&self.path)?;
        Ok(())
    }
}

impl Write for RotatingLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            // Reset either way, a failing rename is not retried on every record
            let _ = self.rotate();
            self.written = 0;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<fs_err::File> {
    fs_err::OpenOptions::new().create(true).append(true).open(path)
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}
