//! Transcribe stage: run the transcription engine on local media.

use std::fs;
use std::path::{Path, PathBuf};

use crate::command::{compile, CompileRequest};
use crate::models::{InputSource, StageKind};

use super::super::errors::{StageError, StageResult};
use super::super::types::{Context, JobState, StageOutcome, TranscribeOutput};
use super::run_stage;

const STAGE_NAME: &str = "Transcribe";

/// Lines the engine prints when a run actually completed. The engine
/// occasionally crashes during teardown after writing all transcripts;
/// seeing one of these markers makes that crash a success.
const SUCCESS_MARKERS: [&str; 3] = [
    "Operation finished in:",
    "Subtitles are written to",
    "Transcription speed:",
];

/// Runs the transcription engine on the job's local media file (the
/// original file input, or the file the download stage fetched).
pub struct TranscribeStage;

impl super::super::stage::PipelineStage for TranscribeStage {
    fn name(&self) -> &str {
        STAGE_NAME
    }

    fn validate_input(&self, ctx: &Context, state: &JobState) -> StageResult<()> {
        let media = state.media_path(ctx.input()).ok_or_else(|| {
            StageError::invalid_input("no local media file; a download stage must run first")
        })?;
        if !media.is_file() {
            return Err(StageError::invalid_input(format!(
                "input file not found: {}",
                media.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StageResult<StageOutcome> {
        let media = state
            .media_path(ctx.input())
            .ok_or_else(|| StageError::invalid_input("no local media file"))?
            .to_path_buf();

        let input = InputSource::File(media.clone());
        let request = CompileRequest {
            settings: ctx.settings(),
            input: &input,
            program: &ctx.tools.engine,
            output_dir: &ctx.output_dir,
            media_dir: &ctx.media_dir,
        };
        let spec = compile(&request, StageKind::Transcribe)
            .map_err(|e| StageError::invalid_input(e.to_string()))?;

        let run = run_stage(ctx, STAGE_NAME, &spec, &SUCCESS_MARKERS)?;

        let marker_success = !run.summary.success && run.markers_seen;
        if !run.summary.success && !marker_success {
            ctx.logger.show_tail(STAGE_NAME);
            return Err(StageError::command_failed(
                spec.tool_name(),
                run.summary.exit_code.unwrap_or(-1),
                ctx.logger.get_tail(),
            ));
        }
        if marker_success {
            ctx.logger.warn(&format!(
                "Engine exited with code {:?} after reporting completion; treating as success",
                run.summary.exit_code
            ));
        }

        let transcripts = find_transcripts(ctx, &media);
        state.transcribe = Some(TranscribeOutput {
            transcripts,
            exit_code: run.summary.exit_code.unwrap_or(0),
            marker_success,
        });
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StageResult<()> {
        let transcribe = state
            .transcribe
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("transcribe result not recorded"))?;

        if transcribe.transcripts.is_empty() {
            return Err(StageError::invalid_output(format!(
                "no transcript appeared in {}",
                ctx.output_dir.display()
            )));
        }
        for path in &transcribe.transcripts {
            if !path.is_file() {
                return Err(StageError::invalid_output(format!(
                    "transcript missing: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Collect transcripts the engine wrote: files in the output directory
/// named after the media file, with one of the selected extensions.
fn find_transcripts(ctx: &Context, media: &Path) -> Vec<PathBuf> {
    let stem = match media.file_stem() {
        Some(stem) => stem.to_string_lossy(),
        None => return Vec::new(),
    };

    let mut transcripts = Vec::new();
    for format in &ctx.settings().engine.output_formats {
        // Built as a string so a dot inside the stem is preserved
        let candidate = ctx
            .output_dir
            .join(format!("{}.{}", stem, format.extension()));
        if let Ok(meta) = fs::metadata(&candidate) {
            if meta.is_file() && meta.len() > 0 {
                transcripts.push(candidate);
            }
        }
    }
    transcripts
}
