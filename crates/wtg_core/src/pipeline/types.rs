//! Core types for the job pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{InputSource, TranscriptionJob};
use crate::process::{CancelToken, CommandRunner};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (stage_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Resolved paths of the external tools a job needs.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// Transcription engine executable.
    pub engine: PathBuf,
    /// Download helper executable; only resolved for URL inputs.
    pub downloader: Option<PathBuf>,
}

/// Read-only context passed to pipeline stages.
///
/// Contains the job, resolved tools, and shared resources that stages
/// can read but not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// The job being run (input + settings snapshot).
    pub job: TranscriptionJob,
    /// Job name/identifier.
    pub job_name: String,
    /// Job-specific working directory (under temp_root).
    pub work_dir: PathBuf,
    /// Directory downloaded media lands in (under work_dir).
    pub media_dir: PathBuf,
    /// Output directory for final transcripts.
    pub output_dir: PathBuf,
    /// Resolved tool executables.
    pub tools: ToolPaths,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Runs the stage processes.
    pub runner: Arc<dyn CommandRunner>,
    /// Cancellation flag shared with the job handle.
    pub cancel: CancelToken,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a job.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job: TranscriptionJob,
        job_name: impl Into<String>,
        work_dir: PathBuf,
        media_dir: PathBuf,
        output_dir: PathBuf,
        tools: ToolPaths,
        logger: Arc<JobLogger>,
        runner: Arc<dyn CommandRunner>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            job,
            job_name: job_name.into(),
            work_dir,
            media_dir,
            output_dir,
            tools,
            logger,
            runner,
            cancel,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback (if set).
    pub fn report_progress(&self, stage_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(stage_name, percent, message);
        }
    }

    /// The settings snapshot for this job.
    pub fn settings(&self) -> &Settings {
        &self.job.settings
    }

    /// The job's original input.
    pub fn input(&self) -> &InputSource {
        &self.job.input
    }
}

/// Mutable job state that accumulates results from pipeline stages.
///
/// Stages add new data but do not overwrite existing values; each
/// stage's output lives in its own section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// Download stage results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadOutput>,
    /// Transcribe stage results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcribe: Option<TranscribeOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Check if the download stage has completed.
    pub fn has_download(&self) -> bool {
        self.download.is_some()
    }

    /// Local media path for transcription: the downloaded file when a
    /// download stage ran, else the original file input.
    pub fn media_path<'a>(&'a self, input: &'a InputSource) -> Option<&'a std::path::Path> {
        if let Some(ref download) = self.download {
            Some(&download.media_path)
        } else {
            input.as_path()
        }
    }
}

/// Output from the download stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutput {
    /// Final path of the downloaded media file.
    pub media_path: PathBuf,
    /// Downloader exit code.
    pub exit_code: i32,
}

/// Output from the transcribe stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeOutput {
    /// Transcript files found in the output directory.
    pub transcripts: Vec<PathBuf>,
    /// Engine exit code.
    pub exit_code: i32,
    /// Whether success was inferred from the engine's completion
    /// markers despite a non-zero exit code.
    pub marker_success: bool,
}

/// Result of executing a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Stage completed successfully.
    Success,
    /// Stage was skipped (preconditions not met, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn job_state_tracks_download() {
        let mut state = JobState::new("test-123");
        assert!(!state.has_download());

        state.download = Some(DownloadOutput {
            media_path: PathBuf::from("/work/media/talk.mp3"),
            exit_code: 0,
        });

        assert!(state.has_download());
    }

    #[test]
    fn media_path_prefers_downloaded_file() {
        let mut state = JobState::new("test");
        let input = InputSource::File(PathBuf::from("/local/talk.mp4"));
        assert_eq!(state.media_path(&input), Some(Path::new("/local/talk.mp4")));

        state.download = Some(DownloadOutput {
            media_path: PathBuf::from("/work/media/talk.mp3"),
            exit_code: 0,
        });
        assert_eq!(
            state.media_path(&input),
            Some(Path::new("/work/media/talk.mp3"))
        );
    }

    #[test]
    fn media_path_is_none_for_url_without_download() {
        let state = JobState::new("test");
        let input = InputSource::Url("https://youtu.be/abc".to_string());
        assert_eq!(state.media_path(&input), None);
    }

    #[test]
    fn job_state_serializes() {
        let state = JobState::new("test-456");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"job_id\":\"test-456\""));
    }
}
