//! Parsing of tdl's terminal output
//!
//! tdl draws a progress table on the terminal. Once ANSI codes are removed a
//! progress line looks roughly like
//! `example(1) ... 42.1% [##########.......] [12.3 MB in 3s; ~ETA: 5s; 4.1 MB/s]`
//! and a finished file is reported as `example(1) ... done! [12 MB in 4s; 3 MB/s]`.

use std::borrow::Cow;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Separates the file name from the status part of a line
const SEGMENT_SEPARATOR: &str = "...";
const DONE_MARKER: &str = "done!";
const NOISE_PREFIXES: [&str; 3] = ["CPU", "[", "All"];

#[allow(clippy::unwrap_used)]
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap());

/// Removes ANSI escape sequences (colors, cursor movement)
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(line, "")
}

/// Percentage and transfer speed of the running download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStatus {
    pub process: String,
    pub speed: String,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.process, self.speed)
    }
}

/// Classification of one output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressLine {
    /// A file finished, carries the status text after the last `...`
    Done(String),
    Progress(ProgressStatus),
    /// Table borders, CPU/memory stats and blank lines
    Noise,
    Unknown(String),
}

/// Classifies one raw output line.
///
/// Lines that cannot be understood come back as `Unknown` and are never an
/// error; tdl's output format is not stable.
pub fn parse_line(raw: &str) -> ProgressLine {
    let stripped = strip_ansi(raw);
    let line = stripped.trim();

    if line.contains(DONE_MARKER) {
        let text = line
            .rsplit_once(SEGMENT_SEPARATOR)
            .map(|(_, tail)| tail)
            .unwrap_or(line)
            .trim();
        return ProgressLine::Done(text.to_string());
    }

    if line.is_empty() || NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
        return ProgressLine::Noise;
    }

    match parse_status(line) {
        Some(status) => ProgressLine::Progress(status),
        None => ProgressLine::Unknown(line.to_string()),
    }
}

fn parse_status(line: &str) -> Option<ProgressStatus> {
    let (_, after_first) = line.split_once(SEGMENT_SEPARATOR)?;
    let process = after_first.split_whitespace().next()?;

    let (_, after_last) = line.rsplit_once(SEGMENT_SEPARATOR)?;
    let speed = after_last.rsplit(';').next()?.trim();
    let speed = speed.strip_suffix(']').unwrap_or(speed).trim();
    if speed.is_empty() {
        return None;
    }

    Some(ProgressStatus {
        process: process.to_string(),
        speed: speed.to_string(),
    })
}

/// What the runner reports while a download is running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress(ProgressStatus),
    Done(String),
}

/// Lets through one progress line out of every `interval`.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: usize,
    seen: usize,
}

impl ProgressThrottle {
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            seen: 0,
        }
    }

    /// Counts one progress line; true when it should be reported
    pub fn tick(&mut self) -> bool {
        self.seen += 1;
        if self.seen >= self.interval {
            self.seen = 0;
            true
        } else {
            false
        }
    }
}
