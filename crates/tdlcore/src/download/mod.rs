//! tdl invocation and output parsing

pub mod progress;
pub mod runner;

pub use progress::{parse_line, strip_ansi, ProgressEvent, ProgressLine, ProgressStatus, ProgressThrottle};
pub use runner::{DownloadOutcome, DownloadRequest, TdlRunner};
