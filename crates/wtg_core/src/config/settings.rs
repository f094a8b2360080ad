//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{ComputeType, Device, OutputFormat, TaskKind, VadMethod};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Engine selection: model, language, device.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Decoding parameters.
    #[serde(default)]
    pub decode: DecodeSettings,

    /// Voice activity detection.
    #[serde(default)]
    pub vad: VadSettings,

    /// Audio pre-processing filters.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Download helper options.
    #[serde(default)]
    pub download: DownloadSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for output, binaries, logs, and temp files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder for final transcripts.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder where provisioned tool binaries are installed.
    #[serde(default = "default_bin_folder")]
    pub bin_folder: String,

    /// Folder for per-job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Root folder for per-job temporary files.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,
}

fn default_output_folder() -> String {
    "output".to_string()
}

fn default_bin_folder() -> String {
    "bin".to_string()
}

fn default_logs_folder() -> String {
    "logs".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            bin_folder: default_bin_folder(),
            logs_folder: default_logs_folder(),
            temp_root: default_temp_root(),
        }
    }
}

/// Engine selection: which model runs where, and what it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Model name (tiny, base, small, medium, large, large-v2, large-v3).
    #[serde(default = "default_model")]
    pub model: String,

    /// Transcribe or translate.
    #[serde(default)]
    pub task: TaskKind,

    /// Source language code, or "auto" for detection.
    #[serde(default = "default_language")]
    pub language: String,

    /// Inference precision.
    #[serde(default)]
    pub compute_type: ComputeType,

    /// Inference device.
    #[serde(default)]
    pub device: Device,

    /// Transcript formats to produce. Must not be empty.
    #[serde(default = "default_output_formats")]
    pub output_formats: BTreeSet<OutputFormat>,
}

fn default_model() -> String {
    "large-v3".to_string()
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_output_formats() -> BTreeSet<OutputFormat> {
    let mut formats = BTreeSet::new();
    formats.insert(OutputFormat::Srt);
    formats
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            task: TaskKind::default(),
            language: default_language(),
            compute_type: ComputeType::default(),
            device: Device::default(),
            output_formats: default_output_formats(),
        }
    }
}

/// Decoding parameters. Values equal to the engine's own default are
/// omitted from the compiled command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeSettings {
    /// Sampling temperature. Engine default: 0.0.
    #[serde(default)]
    pub temperature: f64,

    /// Beam search width. Engine default: 5.
    #[serde(default = "default_beam_size")]
    pub beam_size: u32,

    /// Candidates when sampling. Engine default: 5.
    #[serde(default = "default_best_of")]
    pub best_of: u32,

    /// Beam search patience. Engine default: 1.0.
    #[serde(default = "default_patience")]
    pub patience: f64,

    /// Text to bias the first window with.
    #[serde(default)]
    pub initial_prompt: String,

    /// Emit per-word timestamps.
    #[serde(default)]
    pub word_timestamps: bool,

    /// Suppress timestamps entirely. Conflicts with `word_timestamps`.
    #[serde(default)]
    pub without_timestamps: bool,

    /// Verbose engine output.
    #[serde(default)]
    pub verbose: bool,

    /// Ask the engine to print progress lines.
    #[serde(default)]
    pub print_progress: bool,

    /// Highlight words in subtitle output. Requires `word_timestamps`.
    #[serde(default)]
    pub highlight_words: bool,
}

fn default_beam_size() -> u32 {
    5
}

fn default_best_of() -> u32 {
    5
}

fn default_patience() -> f64 {
    1.0
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            beam_size: default_beam_size(),
            best_of: default_best_of(),
            patience: default_patience(),
            initial_prompt: String::new(),
            word_timestamps: false,
            without_timestamps: false,
            verbose: false,
            print_progress: false,
            highlight_words: false,
        }
    }
}

/// Voice activity detection settings. Threshold options are only
/// compiled in when `enabled` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VadSettings {
    /// Enable the VAD filter.
    #[serde(default)]
    pub enabled: bool,

    /// VAD backend.
    #[serde(default)]
    pub method: VadMethod,

    /// Speech probability threshold.
    #[serde(default = "default_vad_threshold")]
    pub threshold: f64,

    /// Minimum speech duration in milliseconds.
    #[serde(default = "default_min_speech_ms")]
    pub min_speech_ms: u32,
}

fn default_vad_threshold() -> f64 {
    0.5
}

fn default_min_speech_ms() -> u32 {
    250
}

impl Default for VadSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            method: VadMethod::default(),
            threshold: default_vad_threshold(),
            min_speech_ms: default_min_speech_ms(),
        }
    }
}

/// Audio pre-processing flags forwarded to the engine's ffmpeg frontend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Convert input to MP3 before transcription.
    #[serde(default)]
    pub convert_to_mp3: bool,

    /// Apply loudness normalization.
    #[serde(default)]
    pub loudness_normalize: bool,

    /// Apply speech normalization.
    #[serde(default)]
    pub speech_normalize: bool,

    /// Tempo adjustment factor in [0.5, 2.0], when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
}

/// Download helper options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSettings {
    /// Download audio only (extracted to MP3) instead of the full video.
    #[serde(default = "default_true")]
    pub audio_only: bool,

    /// Keep successfully downloaded media next to the transcripts
    /// instead of deleting it with the job's temp files.
    #[serde(default)]
    pub keep_media: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            audio_only: true,
            keep_media: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (filter raw tool output, show tail on error).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of output lines kept for the error tail.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Show timestamps in log output.
    #[serde(default)]
    pub show_timestamps: bool,
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_timestamps: false,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Engine,
    Decode,
    Vad,
    Audio,
    Download,
    Logging,
}

impl ConfigSection {
    /// All sections, in file order.
    pub fn all() -> &'static [ConfigSection] {
        &[
            ConfigSection::Paths,
            ConfigSection::Engine,
            ConfigSection::Decode,
            ConfigSection::Vad,
            ConfigSection::Audio,
            ConfigSection::Download,
            ConfigSection::Logging,
        ]
    }

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Engine => "engine",
            ConfigSection::Decode => "decode",
            ConfigSection::Vad => "vad",
            ConfigSection::Audio => "audio",
            ConfigSection::Download => "download",
            ConfigSection::Logging => "logging",
        }
    }

    /// One-line comment written above the section in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output, binary, log, and temp directories",
            ConfigSection::Engine => "Transcription engine selection",
            ConfigSection::Decode => "Decoding parameters",
            ConfigSection::Vad => "Voice activity detection",
            ConfigSection::Audio => "Audio pre-processing",
            ConfigSection::Download => "Download helper options",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("output_folder"));
        assert!(toml.contains("model = \"large-v3\""));
    }

    #[test]
    fn settings_round_trip() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[engine]\nmodel = \"base\"";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.engine.model, "base");
        assert_eq!(parsed.engine.language, "auto");
        assert_eq!(parsed.decode.beam_size, 5);
        assert!(parsed.download.audio_only);
        assert!(parsed
            .engine
            .output_formats
            .contains(&OutputFormat::Srt));
    }

    #[test]
    fn default_formats_is_srt_only() {
        let settings = Settings::default();
        assert_eq!(settings.engine.output_formats.len(), 1);
        assert!(settings.engine.output_formats.contains(&OutputFormat::Srt));
    }
}
