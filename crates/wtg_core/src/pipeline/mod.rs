//! Job pipeline: stage sequencing, single-flight control, cleanup.

pub mod errors;
pub mod job;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod types;

pub use errors::{PipelineError, PipelineResult, StageError, StageResult};
pub use job::{JobController, JobHandle, SharedLogCallback, SharedProgressCallback};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use stage::PipelineStage;
pub use stages::{DownloadStage, TranscribeStage};
pub use types::{
    Context, DownloadOutput, JobState, ProgressCallback, StageOutcome, ToolPaths,
    TranscribeOutput,
};
