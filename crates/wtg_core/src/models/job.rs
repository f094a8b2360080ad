//! Job description types: what the user asked to transcribe.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// Where the audio/video comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// A local media file.
    File(PathBuf),
    /// A remote URL fetched by the download helper before transcribing.
    Url(String),
}

impl InputSource {
    /// Classify a raw user input string as a URL or a local path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            InputSource::Url(trimmed.to_string())
        } else {
            InputSource::File(PathBuf::from(trimmed))
        }
    }

    /// Whether a download stage is needed before transcription.
    pub fn is_url(&self) -> bool {
        matches!(self, InputSource::Url(_))
    }

    /// Local path, if this is a file input.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            InputSource::File(path) => Some(path),
            InputSource::Url(_) => None,
        }
    }

    /// Short human-readable name derived from the input, safe for use
    /// in filenames (log file, work directory).
    pub fn job_name(&self) -> String {
        let raw = match self {
            InputSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "job".to_string()),
            InputSource::Url(url) => url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|tail| !tail.is_empty())
                .unwrap_or("download")
                .to_string(),
        };
        sanitize_name(&raw)
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::File(path) => write!(f, "{}", path.display()),
            InputSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// One user-initiated transcription request.
///
/// Immutable for the duration of a run: the settings are snapshotted at
/// submit time so mid-run edits in the UI cannot change a running job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionJob {
    /// Input file or URL.
    pub input: InputSource,
    /// Settings snapshot taken when the job was submitted.
    pub settings: Settings,
}

impl TranscriptionJob {
    /// Create a job from an input and a settings snapshot.
    pub fn new(input: InputSource, settings: Settings) -> Self {
        Self { input, settings }
    }

    /// Name used for logs and the work directory.
    pub fn name(&self) -> String {
        self.input.job_name()
    }
}

/// Replace filesystem-hostile characters so the name can be used in paths.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '&' | '=' => '_',
            _ => c,
        })
        .collect();
    if cleaned.is_empty() {
        "job".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_detects_urls() {
        assert!(InputSource::parse("https://youtu.be/abc").is_url());
        assert!(InputSource::parse("http://example.com/v.mp4").is_url());
        assert!(!InputSource::parse("/home/user/talk.mp4").is_url());
        assert!(!InputSource::parse("relative/clip.wav").is_url());
    }

    #[test]
    fn job_name_from_file_uses_stem() {
        let input = InputSource::parse("/media/interview final.mp4");
        assert_eq!(input.job_name(), "interview final");
    }

    #[test]
    fn job_name_from_url_uses_tail() {
        let input = InputSource::parse("https://youtu.be/abc123");
        assert_eq!(input.job_name(), "abc123");
    }

    #[test]
    fn job_name_sanitizes_query_strings() {
        let input = InputSource::parse("https://example.com/watch?v=abc");
        assert_eq!(input.job_name(), "watch_v_abc");
    }
}
