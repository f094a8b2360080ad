//! Pipeline stage trait definition.
//!
//! All pipeline stages implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StageResult;
use super::types::{Context, JobState, StageOutcome};

/// Trait for pipeline stages.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the stage's work
/// 3. `validate_output` - Verify the stage produced valid output
///
/// `validate_input` sees the accumulated `JobState` because later
/// stages consume outputs of earlier ones (the transcribe stage reads
/// the downloaded media path).
pub trait PipelineStage: Send + Sync {
    /// Get the stage name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    ///
    /// Should check that all required preconditions are met (files
    /// exist, previous stages recorded their outputs, etc.).
    fn validate_input(&self, ctx: &Context, state: &JobState) -> StageResult<()>;

    /// Execute the stage's main work.
    ///
    /// Should perform the stage's processing and record results in
    /// `state`. Use `ctx.logger` for logging and `ctx.report_progress()`
    /// for progress.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StageResult<StageOutcome>;

    /// Validate outputs after execution.
    ///
    /// Called after `execute` returns `Success`. Should verify that the
    /// stage produced valid output (files exist, state populated).
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStage {
        name: &'static str,
    }

    impl PipelineStage for MockStage {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context, _state: &JobState) -> StageResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StageResult<StageOutcome> {
            Ok(StageOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn stage_trait_object_works() {
        let stage: Box<dyn PipelineStage> = Box::new(MockStage { name: "TestStage" });
        assert_eq!(stage.name(), "TestStage");
    }
}
