//! Data model: enums, job descriptions, and compiled stage specs.

pub mod enums;
pub mod job;
pub mod stage;

pub use enums::{
    ComputeType, Device, JobStatus, OutputFormat, StageKind, TaskKind, VadMethod,
};
pub use job::{InputSource, TranscriptionJob};
pub use stage::StageSpec;
