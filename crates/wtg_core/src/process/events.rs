//! Process supervision types: events, cancellation, exit summaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Event emitted while an external process runs.
///
/// Output is streamed line by line; the whole output is never buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// One line of child output.
    OutputLine { line: String, is_stderr: bool },
    /// Progress percentage parsed from an output line.
    Progress(u8),
}

/// Final outcome of one supervised process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitSummary {
    /// Exit code, or `None` when killed by a signal.
    pub exit_code: Option<i32>,
    /// Whether the process exited with code 0.
    pub success: bool,
    /// Whether the process was stopped by a cancellation request.
    pub cancelled: bool,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Errors from launching or supervising a process.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Executable not found: {program}")]
    NotFound { program: String },

    #[error("Permission denied launching: {program}")]
    PermissionDenied { program: String },

    #[error("Failed to launch {program}: {message}")]
    LaunchFailed { program: String, message: String },

    #[error("I/O error while supervising {program}: {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Map a spawn error to the right variant.
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ProcessError::NotFound {
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => ProcessError::PermissionDenied {
                program: program.to_string(),
            },
            _ => ProcessError::LaunchFailed {
                program: program.to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Shared cancellation flag, observed cooperatively by the supervisor
/// and the pipeline between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Extract a progress percentage from a tool output line.
///
/// Both the engine and the downloader print `NN%` or `NN.N%` tokens in
/// their progress lines. Values above 100 are ignored.
pub fn parse_progress(line: &str) -> Option<u8> {
    let percent_pos = line.find('%')?;
    let head = &line[..percent_pos];

    // Walk back over the numeric token preceding '%'
    let start = head
        .rfind(|c: char| !c.is_ascii_digit() && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0);
    let token = &head[start..];
    if token.is_empty() {
        return None;
    }

    let value: f64 = token.parse().ok()?;
    if (0.0..=100.0).contains(&value) {
        Some(value as u8)
    } else {
        None
    }
}
