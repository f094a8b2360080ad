//! Configuration compiler: settings -> external-process argument lists.
//!
//! Pure translation, no I/O. The same inputs always produce the same
//! `StageSpec`; validation failures report every conflict at once so the
//! UI can highlight all offending fields.

use std::path::Path;

use thiserror::Error;

use crate::config::Settings;
use crate::models::{InputSource, StageKind, StageSpec};

/// Errors from compiling a configuration into a stage invocation.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Invalid configuration: {}", conflicts.join("; "))]
    InvalidConfiguration { conflicts: Vec<String> },
}

impl CompileError {
    /// List of conflicting/invalid fields, for UI display.
    pub fn conflicts(&self) -> &[String] {
        match self {
            CompileError::InvalidConfiguration { conflicts } => conflicts,
        }
    }
}

/// Everything the compiler needs to produce one stage invocation.
///
/// Paths are resolved by the caller (provisioner + job setup); the
/// compiler itself never touches the filesystem.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Settings snapshot for this job.
    pub settings: &'a Settings,
    /// Effective input for this stage: the original job input for a
    /// download stage, the local media file for a transcribe stage.
    pub input: &'a InputSource,
    /// Resolved path of the tool this stage runs.
    pub program: &'a Path,
    /// Directory transcripts are written to (transcribe stage).
    pub output_dir: &'a Path,
    /// Directory downloaded media lands in (download stage).
    pub media_dir: &'a Path,
}

/// Compile one stage of a job into a concrete invocation.
pub fn compile(request: &CompileRequest, stage: StageKind) -> Result<StageSpec, CompileError> {
    let mut conflicts = validate_settings(request.settings);

    match (stage, request.input) {
        (StageKind::Transcribe, InputSource::Url(_)) => {
            conflicts.push(
                "transcribe stage requires a local file; a download stage must run first"
                    .to_string(),
            );
        }
        (StageKind::Download, InputSource::File(_)) => {
            conflicts.push("download stage requires a URL input".to_string());
        }
        _ => {}
    }

    if !conflicts.is_empty() {
        return Err(CompileError::InvalidConfiguration { conflicts });
    }

    let spec = match stage {
        StageKind::Transcribe => compile_transcribe(request),
        StageKind::Download => compile_download(request),
    };
    Ok(spec)
}

/// Check the settings for internal conflicts, independent of stage.
pub fn validate_settings(settings: &Settings) -> Vec<String> {
    let mut conflicts = Vec::new();

    if settings.engine.output_formats.is_empty() {
        conflicts.push("at least one output format must be selected".to_string());
    }
    if settings.decode.word_timestamps && settings.decode.without_timestamps {
        conflicts
            .push("word_timestamps cannot be combined with without_timestamps".to_string());
    }
    if settings.decode.highlight_words && !settings.decode.word_timestamps {
        conflicts.push("highlight_words requires word_timestamps".to_string());
    }
    if let Some(tempo) = settings.audio.tempo {
        if !(0.5..=2.0).contains(&tempo) {
            conflicts.push(format!("tempo {} outside the supported range 0.5-2.0", tempo));
        }
    }

    conflicts
}

/// Build the transcription engine invocation.
///
/// Option order is fixed: input path, engine selection, value options,
/// boolean flags, output formats. Options whose value equals the
/// engine's own default are omitted.
fn compile_transcribe(request: &CompileRequest) -> StageSpec {
    let settings = request.settings;
    let engine = &settings.engine;
    let decode = &settings.decode;
    let vad = &settings.vad;
    let audio = &settings.audio;

    let mut args: Vec<String> = Vec::new();

    let input_path = match request.input {
        InputSource::File(path) => path.to_string_lossy().into_owned(),
        // Unreachable after validation; keep compile total.
        InputSource::Url(url) => url.clone(),
    };
    args.push(input_path);

    args.push("-m".into());
    args.push(engine.model.clone());
    args.push("--task".into());
    args.push(engine.task.cli_value().into());
    if engine.language != "auto" {
        args.push("-l".into());
        args.push(engine.language.clone());
    }
    args.push("--compute_type".into());
    args.push(engine.compute_type.cli_value().into());
    args.push("--device".into());
    args.push(engine.device.cli_value().into());

    if decode.temperature > 0.0 {
        args.push("--temperature".into());
        args.push(format_float(decode.temperature));
    }
    if decode.beam_size != 5 {
        args.push("--beam_size".into());
        args.push(decode.beam_size.to_string());
    }
    if decode.best_of != 5 {
        args.push("--best_of".into());
        args.push(decode.best_of.to_string());
    }
    if decode.patience != 1.0 {
        args.push("--patience".into());
        args.push(format_float(decode.patience));
    }
    if !decode.initial_prompt.is_empty() {
        args.push("--initial_prompt".into());
        args.push(decode.initial_prompt.clone());
    }
    args.push("--output_dir".into());
    args.push(request.output_dir.to_string_lossy().into_owned());
    if vad.enabled {
        args.push("--vad_method".into());
        args.push(vad.method.cli_value().into());
        args.push("--vad_threshold".into());
        args.push(format_float(vad.threshold));
        args.push("--vad_min_speech_duration_ms".into());
        args.push(vad.min_speech_ms.to_string());
    }
    if let Some(tempo) = audio.tempo {
        args.push("--ff_tempo".into());
        args.push(format_float(tempo));
    }

    // Boolean flags, fixed order
    if decode.word_timestamps {
        args.push("--word_timestamps".into());
    }
    if decode.without_timestamps {
        args.push("--without_timestamps".into());
    }
    if decode.verbose {
        args.push("--verbose".into());
    }
    if decode.print_progress {
        args.push("--print_progress".into());
    }
    if decode.highlight_words {
        args.push("--highlight_words".into());
    }
    if vad.enabled {
        args.push("--vad_filter".into());
    }
    if audio.convert_to_mp3 {
        args.push("--ff_mp3".into());
    }
    if audio.loudness_normalize {
        args.push("--ff_loudnorm".into());
    }
    if audio.speech_normalize {
        args.push("--ff_speechnorm".into());
    }

    args.push("--output_format".into());
    // BTreeSet iteration keeps the format order deterministic
    for format in &engine.output_formats {
        args.push(format.cli_value().into());
    }

    StageSpec::new(StageKind::Transcribe, request.program.to_path_buf(), args)
}

/// Build the downloader invocation.
///
/// `--print after_move:filepath` makes the final media path the last
/// stdout line, which the download stage records for the next stage.
fn compile_download(request: &CompileRequest) -> StageSpec {
    let download = &request.settings.download;

    let mut args: Vec<String> = vec!["--no-playlist".into(), "--newline".into()];

    if download.audio_only {
        args.push("-f".into());
        args.push("bestaudio/best".into());
        args.push("-x".into());
        args.push("--audio-format".into());
        args.push("mp3".into());
        args.push("--audio-quality".into());
        args.push("192K".into());
    } else {
        args.push("-f".into());
        args.push("bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".into());
    }

    args.push("-o".into());
    args.push(
        request
            .media_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned(),
    );
    args.push("--print".into());
    args.push("after_move:filepath".into());
    args.push("--no-simulate".into());

    let url = match request.input {
        InputSource::Url(url) => url.clone(),
        InputSource::File(path) => path.to_string_lossy().into_owned(),
    };
    args.push(url);

    StageSpec::new(StageKind::Download, request.program.to_path_buf(), args)
}

/// Render a float the way the engine expects (always a decimal point).
fn format_float(value: f64) -> String {
    if value == value.trunc() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
