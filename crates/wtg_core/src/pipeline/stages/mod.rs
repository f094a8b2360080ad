//! Concrete pipeline stages.

pub mod download;
pub mod transcribe;

pub use download::DownloadStage;
pub use transcribe::TranscribeStage;

use crate::models::StageSpec;
use crate::process::{ExitSummary, ProcessEvent};

use super::errors::{StageError, StageResult};
use super::types::Context;

/// What a supervised stage process produced, beyond its exit status.
pub(crate) struct StageRun {
    pub summary: ExitSummary,
    /// Last non-empty stdout line (the downloader prints the final
    /// media path there).
    pub last_stdout: Option<String>,
    /// Whether any of the given completion markers appeared in output.
    pub markers_seen: bool,
}

/// Run a stage's process, wiring output and progress into the job
/// logger and progress callback. Returns `StageError::Cancelled` when
/// the run was stopped by the cancel token.
pub(crate) fn run_stage(
    ctx: &Context,
    stage_name: &str,
    spec: &StageSpec,
    markers: &[&str],
) -> StageResult<StageRun> {
    ctx.logger.command(&spec.display_command());

    let mut last_stdout: Option<String> = None;
    let mut markers_seen = false;

    let summary = {
        let logger = &ctx.logger;
        ctx.runner.run(spec, &ctx.cancel, &mut |event| match event {
            ProcessEvent::OutputLine { line, is_stderr } => {
                if !is_stderr && !line.trim().is_empty() {
                    last_stdout = Some(line.trim().to_string());
                }
                if !markers_seen && markers.iter().any(|m| line.contains(m)) {
                    markers_seen = true;
                }
                logger.output_line(&line, is_stderr);
            }
            ProcessEvent::Progress(percent) => {
                // The progress callback sees every update; the step
                // filter only thins the log file.
                ctx.report_progress(stage_name, percent as u32, "");
                logger.progress(percent as u32);
            }
        })?
    };

    if summary.cancelled {
        return Err(StageError::Cancelled);
    }

    Ok(StageRun {
        summary,
        last_stdout,
        markers_seen,
    })
}
