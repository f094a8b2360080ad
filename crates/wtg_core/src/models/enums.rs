//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Task passed to the transcription engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Transcribe in the source language.
    #[default]
    Transcribe,
    /// Translate to English.
    Translate,
}

impl TaskKind {
    /// Value passed on the engine command line.
    pub fn cli_value(&self) -> &'static str {
        match self {
            TaskKind::Transcribe => "transcribe",
            TaskKind::Translate => "translate",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cli_value())
    }
}

/// Transcript output format produced by the engine.
///
/// The `Ord` impl fixes the order formats are emitted on the command
/// line, which keeps compiled argument lists deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Srt,
    Vtt,
    Txt,
    Json,
    Lrc,
    Tsv,
}

impl OutputFormat {
    /// Value passed after `--output_format`.
    pub fn cli_value(&self) -> &'static str {
        match self {
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Lrc => "lrc",
            OutputFormat::Tsv => "tsv",
        }
    }

    /// File extension of transcripts in this format.
    pub fn extension(&self) -> &'static str {
        self.cli_value()
    }

    /// All supported formats.
    pub fn all() -> &'static [OutputFormat] {
        &[
            Self::Srt,
            Self::Vtt,
            Self::Txt,
            Self::Json,
            Self::Lrc,
            Self::Tsv,
        ]
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cli_value())
    }
}

/// Compute type for the engine's inference backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComputeType {
    #[serde(rename = "default")]
    EngineDefault,
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int8_float16")]
    Int8Float16,
    #[serde(rename = "int8_float32")]
    Int8Float32,
    #[serde(rename = "int16")]
    Int16,
    #[default]
    #[serde(rename = "float16")]
    Float16,
    #[serde(rename = "float32")]
    Float32,
    #[serde(rename = "bfloat16")]
    Bfloat16,
}

impl ComputeType {
    /// Value passed after `--compute_type`.
    pub fn cli_value(&self) -> &'static str {
        match self {
            ComputeType::EngineDefault => "default",
            ComputeType::Auto => "auto",
            ComputeType::Int8 => "int8",
            ComputeType::Int8Float16 => "int8_float16",
            ComputeType::Int8Float32 => "int8_float32",
            ComputeType::Int16 => "int16",
            ComputeType::Float16 => "float16",
            ComputeType::Float32 => "float32",
            ComputeType::Bfloat16 => "bfloat16",
        }
    }
}

impl std::fmt::Display for ComputeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cli_value())
    }
}

/// Inference device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cuda,
    Cpu,
}

impl Device {
    /// Value passed after `--device`.
    pub fn cli_value(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cli_value())
    }
}

/// Voice activity detection backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VadMethod {
    #[default]
    #[serde(rename = "silero_v4_fw")]
    SileroV4Fw,
    #[serde(rename = "silero_v5_fw")]
    SileroV5Fw,
    #[serde(rename = "silero_v3")]
    SileroV3,
    #[serde(rename = "silero_v4")]
    SileroV4,
    #[serde(rename = "silero_v5")]
    SileroV5,
    #[serde(rename = "pyannote_v3")]
    PyannoteV3,
    #[serde(rename = "pyannote_onnx_v3")]
    PyannoteOnnxV3,
    #[serde(rename = "auditok")]
    Auditok,
    #[serde(rename = "webrtc")]
    Webrtc,
}

impl VadMethod {
    /// Value passed after `--vad_method`.
    pub fn cli_value(&self) -> &'static str {
        match self {
            VadMethod::SileroV4Fw => "silero_v4_fw",
            VadMethod::SileroV5Fw => "silero_v5_fw",
            VadMethod::SileroV3 => "silero_v3",
            VadMethod::SileroV4 => "silero_v4",
            VadMethod::SileroV5 => "silero_v5",
            VadMethod::PyannoteV3 => "pyannote_v3",
            VadMethod::PyannoteOnnxV3 => "pyannote_onnx_v3",
            VadMethod::Auditok => "auditok",
            VadMethod::Webrtc => "webrtc",
        }
    }
}

impl std::fmt::Display for VadMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cli_value())
    }
}

/// Kind of pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Fetch remote media with the download helper.
    Download,
    /// Run the transcription engine on a local file.
    Transcribe,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Download => write!(f, "Download"),
            StageKind::Transcribe => write!(f, "Transcribe"),
        }
    }
}

/// Terminal and in-flight states of a job run.
///
/// Terminal states are final; a new run starts from a fresh `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Submitted but not yet started.
    Pending,
    /// Pipeline is executing stages.
    Running,
    /// Every stage succeeded.
    Succeeded,
    /// A stage failed; the reason is preserved for the user.
    Failed(String),
    /// Cancelled by the user; a clean, non-error outcome.
    Cancelled,
}

impl JobStatus {
    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Succeeded => write!(f, "Succeeded"),
            JobStatus::Failed(reason) => write!(f, "Failed: {}", reason),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_serializes_lowercase() {
        let json = serde_json::to_string(&OutputFormat::Srt).unwrap();
        assert_eq!(json, "\"srt\"");
    }

    #[test]
    fn compute_type_round_trips_cli_names() {
        let json = serde_json::to_string(&ComputeType::Int8Float16).unwrap();
        assert_eq!(json, "\"int8_float16\"");
        let back: ComputeType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ComputeType::Int8Float16);
    }

    #[test]
    fn job_status_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed("boom".into()).is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }
}
