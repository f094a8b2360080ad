//! Pipeline runner that executes stages in sequence.

use super::errors::{PipelineError, PipelineResult, StageError};
use super::stage::PipelineStage;
use super::types::{Context, JobState, StageOutcome};

/// Pipeline that runs a sequence of stages.
///
/// Stages execute strictly in order with validation before and after
/// each one; a stage starts only after the previous one succeeded.
/// Cancellation is observed at stage boundaries (and inside a running
/// stage by the process supervisor).
pub struct Pipeline {
    /// Stages to execute in order.
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage (builder pattern).
    pub fn with_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run the pipeline with the given context and state.
    ///
    /// Executes each stage in order:
    /// 1. Check for cancellation
    /// 2. Run `validate_input`
    /// 3. Run `execute`
    /// 4. Run `validate_output` (if execute returned Success)
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            stages_completed: Vec::new(),
            stages_skipped: Vec::new(),
        };

        let total_stages = self.stages.len();

        for (i, stage) in self.stages.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                ctx.logger
                    .warn(&format!("Cancelled before stage '{}'", stage.name()));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            let stage_name = stage.name();
            ctx.logger.stage(stage_name);

            let percent = ((i as f64 / total_stages as f64) * 100.0) as u32;
            ctx.report_progress(stage_name, percent, &format!("Starting {}", stage_name));

            ctx.logger
                .debug(&format!("Validating input for '{}'", stage_name));
            if let Err(e) = stage.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::stage_failed(&ctx.job_name, stage_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", stage_name));
            let outcome = stage.execute(ctx, state).map_err(|e| {
                // In-stage cancellation surfaces as the clean terminal state
                if matches!(e, StageError::Cancelled) {
                    ctx.logger.warn(&format!("Stage '{}' cancelled", stage_name));
                    PipelineError::cancelled(&ctx.job_name)
                } else {
                    ctx.logger.error(&format!("Execution failed: {}", e));
                    PipelineError::stage_failed(&ctx.job_name, stage_name, e)
                }
            })?;

            match outcome {
                StageOutcome::Success => {
                    ctx.logger
                        .debug(&format!("Validating output for '{}'", stage_name));
                    if let Err(e) = stage.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::stage_failed(&ctx.job_name, stage_name, e));
                    }

                    ctx.logger.success(&format!("{} completed", stage_name));
                    result.stages_completed.push(stage_name.to_string());
                }
                StageOutcome::Skipped(reason) => {
                    ctx.logger
                        .info(&format!("{} skipped: {}", stage_name, reason));
                    result.stages_skipped.push(stage_name.to_string());
                }
            }
        }

        ctx.report_progress("Complete", 100, "Pipeline finished");
        ctx.logger.success("Pipeline completed successfully");

        Ok(result)
    }

    /// Get the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Get stage names in order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Stages that completed successfully.
    pub stages_completed: Vec<String>,
    /// Stages that were skipped.
    pub stages_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all stages completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.stages_skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::{DownloadStage, TranscribeStage};

    #[test]
    fn pipeline_builds_in_order() {
        let pipeline = Pipeline::new()
            .with_stage(DownloadStage)
            .with_stage(TranscribeStage);

        assert_eq!(pipeline.stage_count(), 2);
        assert_eq!(pipeline.stage_names(), vec!["Download", "Transcribe"]);
    }
}
