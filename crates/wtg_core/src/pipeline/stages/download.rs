//! Download stage: fetch remote media with the download helper.

use std::fs;
use std::path::PathBuf;

use crate::command::{compile, CompileRequest};
use crate::models::StageKind;

use super::super::errors::{StageError, StageResult};
use super::super::types::{Context, DownloadOutput, JobState, StageOutcome};
use super::run_stage;

const STAGE_NAME: &str = "Download";

/// Fetches the job's URL input into the media directory.
///
/// The downloader is invoked with `--print after_move:filepath`, so its
/// last stdout line is the final media path; that path is recorded in
/// the job state for the transcribe stage.
pub struct DownloadStage;

impl super::super::stage::PipelineStage for DownloadStage {
    fn name(&self) -> &str {
        STAGE_NAME
    }

    fn validate_input(&self, ctx: &Context, _state: &JobState) -> StageResult<()> {
        if !ctx.input().is_url() {
            return Err(StageError::invalid_input(
                "download stage requires a URL input",
            ));
        }
        if ctx.tools.downloader.is_none() {
            return Err(StageError::invalid_input(
                "download helper was not resolved for this job",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StageResult<StageOutcome> {
        // Checked in validate_input
        let downloader = ctx
            .tools
            .downloader
            .as_deref()
            .ok_or_else(|| StageError::invalid_input("download helper missing"))?;

        fs::create_dir_all(&ctx.media_dir)
            .map_err(|e| StageError::io_error("creating media directory", e))?;

        let request = CompileRequest {
            settings: ctx.settings(),
            input: ctx.input(),
            program: downloader,
            output_dir: &ctx.output_dir,
            media_dir: &ctx.media_dir,
        };
        let spec = compile(&request, StageKind::Download)
            .map_err(|e| StageError::invalid_input(e.to_string()))?;

        let run = run_stage(ctx, STAGE_NAME, &spec, &[])?;

        if !run.summary.success {
            ctx.logger.show_tail(STAGE_NAME);
            return Err(StageError::command_failed(
                spec.tool_name(),
                run.summary.exit_code.unwrap_or(-1),
                ctx.logger.get_tail(),
            ));
        }

        let media_path = run
            .last_stdout
            .map(PathBuf::from)
            .filter(|p| p.is_file())
            .ok_or_else(|| {
                StageError::invalid_output("downloader did not report a media file path")
            })?;

        ctx.logger
            .info(&format!("Downloaded media: {}", media_path.display()));
        state.download = Some(DownloadOutput {
            media_path,
            exit_code: run.summary.exit_code.unwrap_or(0),
        });
        Ok(StageOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StageResult<()> {
        let download = state
            .download
            .as_ref()
            .ok_or_else(|| StageError::invalid_output("download result not recorded"))?;

        match fs::metadata(&download.media_path) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(StageError::invalid_output(format!(
                "downloaded media is empty: {}",
                download.media_path.display()
            ))),
            Err(_) => Err(StageError::invalid_output(format!(
                "downloaded media missing: {}",
                download.media_path.display()
            ))),
        }
    }
}
