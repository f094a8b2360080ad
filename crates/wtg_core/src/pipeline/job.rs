//! Job submission and lifecycle: single-flight controller and handle.
//!
//! `JobController::submit` validates the configuration, rejects a second
//! job while one is running, and spawns a worker thread that provisions
//! tools, builds the stage list, runs the pipeline, and cleans up.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::command::validate_settings;
use crate::logging::{JobLogger, LogConfig, UiLogCallback};
use crate::models::{JobStatus, TranscriptionJob};
use crate::process::{CancelToken, CommandRunner, ProcessSupervisor};
use crate::provision::{Provisioner, ToolManifest};

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::Pipeline;
use super::stages::{DownloadStage, TranscribeStage};
use super::types::{Context, JobState, ToolPaths};

/// Shared callback types, clonable into the worker thread.
pub type SharedLogCallback = Arc<dyn Fn(&str) + Send + Sync>;
pub type SharedProgressCallback = Arc<dyn Fn(&str, u32, &str) + Send + Sync>;

/// State shared between the controller, the handle, and the worker.
struct Shared {
    status: Mutex<JobStatus>,
    done: Condvar,
    cancel: CancelToken,
}

impl Shared {
    fn set_status(&self, status: JobStatus) {
        let terminal = status.is_terminal();
        *self.status.lock() = status;
        if terminal {
            self.done.notify_all();
        }
    }
}

/// Handle to a submitted job.
pub struct JobHandle {
    shared: Arc<Shared>,
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("status", &self.status())
            .finish()
    }
}

impl JobHandle {
    /// Current job status.
    pub fn status(&self) -> JobStatus {
        self.shared.status.lock().clone()
    }

    /// Request cancellation. The running stage's process is asked to
    /// stop and force-killed after the grace period.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
    }

    /// Block until the job reaches a terminal state, and return it.
    pub fn wait(&self) -> JobStatus {
        let mut status = self.shared.status.lock();
        while !status.is_terminal() {
            self.shared.done.wait(&mut status);
        }
        status.clone()
    }
}

/// Accepts jobs and enforces the one-run-at-a-time policy.
pub struct JobController {
    runner: Arc<dyn CommandRunner>,
    manifest: ToolManifest,
    active: Mutex<Option<Arc<Shared>>>,
    ui_callback: Option<SharedLogCallback>,
    progress_callback: Option<SharedProgressCallback>,
}

impl JobController {
    /// Controller running real processes.
    pub fn new() -> Self {
        Self::with_runner(Arc::new(ProcessSupervisor::new()))
    }

    /// Controller with an injected runner (tests use a scripted fake).
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            manifest: ToolManifest::builtin(),
            active: Mutex::new(None),
            ui_callback: None,
            progress_callback: None,
        }
    }

    /// Mirror job log messages to a UI callback.
    pub fn with_ui_callback(mut self, callback: SharedLogCallback) -> Self {
        self.ui_callback = Some(callback);
        self
    }

    /// Receive progress updates.
    pub fn with_progress_callback(mut self, callback: SharedProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Submit a job for execution.
    ///
    /// Fails fast, with no side effects, when the configuration is
    /// invalid or another job is still running.
    pub fn submit(&self, job: TranscriptionJob) -> PipelineResult<JobHandle> {
        let conflicts = validate_settings(&job.settings);
        if !conflicts.is_empty() {
            return Err(PipelineError::InvalidConfiguration { conflicts });
        }

        let mut active = self.active.lock();
        if let Some(ref shared) = *active {
            if !shared.status.lock().is_terminal() {
                return Err(PipelineError::JobAlreadyRunning);
            }
        }

        let shared = Arc::new(Shared {
            status: Mutex::new(JobStatus::Pending),
            done: Condvar::new(),
            cancel: CancelToken::new(),
        });
        *active = Some(Arc::clone(&shared));
        drop(active);

        let worker_shared = Arc::clone(&shared);
        let runner = Arc::clone(&self.runner);
        let manifest = self.manifest.clone();
        let ui_callback = self.ui_callback.clone();
        let progress_callback = self.progress_callback.clone();

        thread::spawn(move || {
            worker_shared.set_status(JobStatus::Running);
            let cancel = worker_shared.cancel.clone();
            let result = run_job(job, runner, manifest, cancel, ui_callback, progress_callback);
            let status = match result {
                Ok(_) => JobStatus::Succeeded,
                Err(PipelineError::Cancelled { .. }) => JobStatus::Cancelled,
                Err(e) => JobStatus::Failed(e.to_string()),
            };
            worker_shared.set_status(status);
        });

        Ok(JobHandle { shared })
    }
}

impl Default for JobController {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one job end to end: provision, pipeline, cleanup.
fn run_job(
    job: TranscriptionJob,
    runner: Arc<dyn CommandRunner>,
    manifest: ToolManifest,
    cancel: CancelToken,
    ui_callback: Option<SharedLogCallback>,
    progress_callback: Option<SharedProgressCallback>,
) -> PipelineResult<JobState> {
    let job_name = job.name();
    let settings = job.settings.clone();
    let paths = &settings.paths;

    let output_dir = PathBuf::from(&paths.output_folder);
    let temp_root = PathBuf::from(&paths.temp_root);
    let run_id = Local::now().format("%Y%m%d_%H%M%S%3f");
    let work_dir = temp_root.join(format!("{}_{}", job_name, run_id));
    let media_dir = work_dir.join("media");

    for dir in [&output_dir, &work_dir] {
        fs::create_dir_all(dir)
            .map_err(|e| PipelineError::setup_failed(&job_name, e.to_string()))?;
    }

    let logger = JobLogger::new(
        &job_name,
        &paths.logs_folder,
        LogConfig::from_settings(&settings.logging),
        ui_callback.map(|cb| Box::new(move |msg: &str| cb(msg)) as UiLogCallback),
    )
    .map_err(|e| PipelineError::setup_failed(&job_name, e.to_string()))?;
    let logger = Arc::new(logger);

    // The state outlives the pipeline run so cleanup can see which
    // stages completed even when a later stage failed.
    let mut state = JobState::new(&job_name);
    let result = run_pipeline(
        &job,
        &job_name,
        &work_dir,
        &media_dir,
        &output_dir,
        runner,
        &manifest,
        cancel,
        Arc::clone(&logger),
        progress_callback,
        &mut state,
    );

    finish_job(&state, &job, &work_dir, &output_dir, &logger);
    logger.flush();
    result.map(|()| state)
}

/// Provision tools, build the stage list, and run the pipeline.
#[allow(clippy::too_many_arguments)]
fn run_pipeline(
    job: &TranscriptionJob,
    job_name: &str,
    work_dir: &Path,
    media_dir: &Path,
    output_dir: &Path,
    runner: Arc<dyn CommandRunner>,
    manifest: &ToolManifest,
    cancel: CancelToken,
    logger: Arc<JobLogger>,
    progress_callback: Option<SharedProgressCallback>,
    state: &mut JobState,
) -> PipelineResult<()> {
    let provisioner = Provisioner::new(&job.settings.paths.bin_folder);

    let engine_dep = manifest.engine();
    let engine = provisioner.ensure(engine_dep).map_err(|e| {
        PipelineError::dependency_unavailable(job_name, &engine_dep.name, e)
    })?;

    let downloader = if job.input.is_url() {
        let dep = manifest.downloader();
        let resolved = provisioner
            .ensure(dep)
            .map_err(|e| PipelineError::dependency_unavailable(job_name, &dep.name, e))?;
        Some(resolved.primary)
    } else {
        None
    };

    let tools = ToolPaths {
        engine: engine.primary,
        downloader,
    };

    let mut ctx = Context::new(
        job.clone(),
        job_name,
        work_dir.to_path_buf(),
        media_dir.to_path_buf(),
        output_dir.to_path_buf(),
        tools,
        logger,
        runner,
        cancel,
    );
    if let Some(cb) = progress_callback {
        ctx = ctx.with_progress_callback(Box::new(move |stage, percent, message| {
            cb(stage, percent, message)
        }));
    }

    let mut pipeline = Pipeline::new();
    if job.input.is_url() {
        pipeline = pipeline.with_stage(DownloadStage);
    }
    pipeline = pipeline.with_stage(TranscribeStage);

    ctx.logger.info(&format!("Input: {}", job.input));
    ctx.logger
        .info(&format!("Stages: {}", pipeline.stage_names().join(" -> ")));

    pipeline.run(&ctx, state)?;
    Ok(())
}

/// Post-run cleanup: keep or drop downloaded media, remove the work dir.
///
/// `keep_media` retains any media from a download stage that completed,
/// including when a later stage failed or was cancelled. Partially
/// downloaded media is never recorded in the state and is always
/// removed with the work dir.
fn finish_job(
    state: &JobState,
    job: &TranscriptionJob,
    work_dir: &Path,
    output_dir: &Path,
    logger: &JobLogger,
) {
    if job.settings.download.keep_media {
        if let Some(ref download) = state.download {
            match retain_media(&download.media_path, output_dir) {
                Ok(target) => {
                    logger.info(&format!("Kept media: {}", target.display()));
                }
                Err(e) => {
                    logger.warn(&format!("Could not keep media: {}", e));
                }
            }
        }
    }

    if work_dir.exists() {
        if let Err(e) = fs::remove_dir_all(work_dir) {
            logger.warn(&format!(
                "Could not remove work dir {}: {}",
                work_dir.display(),
                e
            ));
        } else {
            debug!(work_dir = %work_dir.display(), "work dir removed");
        }
    }
}

/// Move a downloaded media file next to the transcripts.
fn retain_media(media: &Path, output_dir: &Path) -> std::io::Result<PathBuf> {
    let file_name = media
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"))?;
    let target = output_dir.join(file_name);
    if fs::rename(media, &target).is_err() {
        fs::copy(media, &target)?;
        fs::remove_file(media)?;
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::{InputSource, StageSpec};
    use crate::process::{ExitSummary, ProcessError, ProcessEvent};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    type FakeHandler = Box<
        dyn Fn(&StageSpec, &CancelToken, &mut dyn FnMut(ProcessEvent)) -> Result<ExitSummary, ProcessError>
            + Send
            + Sync,
    >;

    struct FakeRunner {
        handler: FakeHandler,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn new(handler: FakeHandler) -> Self {
            Self {
                handler,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(
            &self,
            spec: &StageSpec,
            cancel: &CancelToken,
            on_event: &mut dyn FnMut(ProcessEvent),
        ) -> Result<ExitSummary, ProcessError> {
            self.calls.lock().push(spec.tool_name());
            (self.handler)(spec, cancel, on_event)
        }
    }

    fn ok_summary() -> ExitSummary {
        ExitSummary {
            exit_code: Some(0),
            success: true,
            cancelled: false,
            duration_ms: 5,
        }
    }

    fn fail_summary(code: i32) -> ExitSummary {
        ExitSummary {
            exit_code: Some(code),
            success: false,
            cancelled: false,
            duration_ms: 5,
        }
    }

    struct TestEnv {
        _dir: TempDir,
        root: PathBuf,
        settings: Settings,
    }

    fn test_env() -> TestEnv {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();

        let bin = root.join("bin");
        fs::create_dir_all(&bin).unwrap();
        for tool in ["faster-whisper-xxl", "ffmpeg", "yt-dlp"] {
            fs::write(bin.join(tool), b"#!/bin/sh\n").unwrap();
        }

        let mut settings = Settings::default();
        settings.paths.output_folder = root.join("output").to_string_lossy().into_owned();
        settings.paths.bin_folder = bin.to_string_lossy().into_owned();
        settings.paths.logs_folder = root.join("logs").to_string_lossy().into_owned();
        settings.paths.temp_root = root.join("temp").to_string_lossy().into_owned();

        TestEnv {
            _dir: dir,
            root,
            settings,
        }
    }

    /// Engine behavior: write `<stem>.srt` into --output_dir and print
    /// a completion marker.
    fn fake_transcribe(spec: &StageSpec, on_event: &mut dyn FnMut(ProcessEvent)) -> ExitSummary {
        let out_pos = spec.args.iter().position(|a| a == "--output_dir").unwrap();
        let output_dir = PathBuf::from(&spec.args[out_pos + 1]);
        let input = PathBuf::from(&spec.args[0]);
        let stem = input.file_stem().unwrap().to_string_lossy().into_owned();
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join(format!("{}.srt", stem)), b"1\n00:00 text\n").unwrap();
        on_event(ProcessEvent::OutputLine {
            line: "Operation finished in: 3 seconds".to_string(),
            is_stderr: false,
        });
        ok_summary()
    }

    /// Downloader behavior: write a media file under the -o template's
    /// directory and print its final path.
    fn fake_download(spec: &StageSpec, on_event: &mut dyn FnMut(ProcessEvent)) -> ExitSummary {
        let o_pos = spec.args.iter().position(|a| a == "-o").unwrap();
        let template = PathBuf::from(&spec.args[o_pos + 1]);
        let media_dir = template.parent().unwrap().to_path_buf();
        fs::create_dir_all(&media_dir).unwrap();
        let media = media_dir.join("My Talk.mp3");
        fs::write(&media, b"audio bytes").unwrap();
        on_event(ProcessEvent::OutputLine {
            line: media.to_string_lossy().into_owned(),
            is_stderr: false,
        });
        ok_summary()
    }

    fn full_fake_runner() -> Arc<FakeRunner> {
        Arc::new(FakeRunner::new(Box::new(|spec, _cancel, on_event| {
            if spec.tool_name() == "yt-dlp" {
                Ok(fake_download(spec, on_event))
            } else {
                Ok(fake_transcribe(spec, on_event))
            }
        })))
    }

    #[test]
    fn invalid_configuration_has_no_side_effects() {
        let env = test_env();
        let mut settings = env.settings.clone();
        settings.engine.output_formats.clear();

        let controller = JobController::with_runner(full_fake_runner());
        let job = TranscriptionJob::new(
            InputSource::File(env.root.join("talk.mp4")),
            settings,
        );

        let err = controller.submit(job).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration { .. }));

        // Nothing was created
        assert!(!env.root.join("output").exists());
        assert!(!env.root.join("logs").exists());
        assert!(!env.root.join("temp").exists());
    }

    #[test]
    fn file_job_produces_one_transcript() {
        let env = test_env();
        let media = env.root.join("interview.mp4");
        fs::write(&media, b"video").unwrap();

        let runner = full_fake_runner();
        let controller = JobController::with_runner(runner.clone());
        let job = TranscriptionJob::new(InputSource::File(media), env.settings.clone());

        let handle = controller.submit(job).unwrap();
        assert_eq!(handle.wait(), JobStatus::Succeeded);

        assert_eq!(runner.calls(), vec!["faster-whisper-xxl"]);
        assert!(env.root.join("output").join("interview.srt").is_file());
    }

    #[test]
    fn url_job_downloads_then_transcribes() {
        let env = test_env();
        let runner = full_fake_runner();
        let controller = JobController::with_runner(runner.clone());
        let job = TranscriptionJob::new(
            InputSource::Url("https://youtu.be/abc123".to_string()),
            env.settings.clone(),
        );

        let handle = controller.submit(job).unwrap();
        assert_eq!(handle.wait(), JobStatus::Succeeded);

        assert_eq!(runner.calls(), vec!["yt-dlp", "faster-whisper-xxl"]);

        // Exactly one transcript, named after the downloaded media
        let outputs: Vec<_> = fs::read_dir(env.root.join("output"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(outputs, vec!["My Talk.srt"]);

        // Work dir (and the media inside it) is gone
        let temp_entries: Vec<_> = fs::read_dir(env.root.join("temp")).unwrap().collect();
        assert!(temp_entries.is_empty());
    }

    #[test]
    fn failed_download_never_starts_transcribe() {
        let env = test_env();
        let runner = Arc::new(FakeRunner::new(Box::new(|spec, _cancel, on_event| {
            assert_eq!(spec.tool_name(), "yt-dlp");
            // Leave a partial file behind, like an interrupted download
            let o_pos = spec.args.iter().position(|a| a == "-o").unwrap();
            let media_dir = PathBuf::from(&spec.args[o_pos + 1])
                .parent()
                .unwrap()
                .to_path_buf();
            fs::create_dir_all(&media_dir).unwrap();
            fs::write(media_dir.join("My Talk.mp3.part"), b"partial").unwrap();
            on_event(ProcessEvent::OutputLine {
                line: "ERROR: unable to download video data".to_string(),
                is_stderr: true,
            });
            Ok(fail_summary(1))
        })));

        let controller = JobController::with_runner(runner.clone());
        let job = TranscriptionJob::new(
            InputSource::Url("https://youtu.be/abc123".to_string()),
            env.settings.clone(),
        );

        let handle = controller.submit(job).unwrap();
        let status = handle.wait();
        assert!(matches!(status, JobStatus::Failed(_)));

        // Transcribe never ran, and the partial download is gone
        assert_eq!(runner.calls(), vec!["yt-dlp"]);
        let temp_entries: Vec<_> = fs::read_dir(env.root.join("temp")).unwrap().collect();
        assert!(temp_entries.is_empty());
    }

    #[test]
    fn second_submit_while_running_is_rejected() {
        let env = test_env();
        let media = env.root.join("talk.mp4");
        fs::write(&media, b"video").unwrap();

        let release = Arc::new(AtomicBool::new(false));
        let release_clone = Arc::clone(&release);
        let runner = Arc::new(FakeRunner::new(Box::new(move |spec, _cancel, on_event| {
            while !release_clone.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(fake_transcribe(spec, on_event))
        })));

        let controller = JobController::with_runner(runner);
        let job = TranscriptionJob::new(InputSource::File(media.clone()), env.settings.clone());

        let handle = controller.submit(job.clone()).unwrap();

        // Running job blocks further submits without disturbing it
        let err = controller.submit(job.clone()).unwrap_err();
        assert!(matches!(err, PipelineError::JobAlreadyRunning));

        release.store(true, Ordering::SeqCst);
        assert_eq!(handle.wait(), JobStatus::Succeeded);

        // Terminal state frees the slot
        let handle = controller.submit(job).unwrap();
        assert_eq!(handle.wait(), JobStatus::Succeeded);
    }

    #[test]
    fn missing_input_file_fails_before_launch() {
        let env = test_env();
        let runner = full_fake_runner();
        let controller = JobController::with_runner(runner.clone());
        let job = TranscriptionJob::new(
            InputSource::File(env.root.join("does_not_exist.mp4")),
            env.settings.clone(),
        );

        let handle = controller.submit(job).unwrap();
        let status = handle.wait();
        assert!(matches!(status, JobStatus::Failed(_)));

        // The engine was never launched and no transcript appeared
        assert!(runner.calls().is_empty());
        let outputs: Vec<_> = fs::read_dir(env.root.join("output")).unwrap().collect();
        assert!(outputs.is_empty());
    }

    #[test]
    fn cancel_produces_cancelled_status_and_cleans_up() {
        let env = test_env();
        let media = env.root.join("talk.mp4");
        fs::write(&media, b"video").unwrap();

        let runner = Arc::new(FakeRunner::new(Box::new(|_spec, cancel, _on_event| {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(ExitSummary {
                exit_code: None,
                success: false,
                cancelled: true,
                duration_ms: 5,
            })
        })));

        let controller = JobController::with_runner(runner);
        let job = TranscriptionJob::new(InputSource::File(media), env.settings.clone());

        let handle = controller.submit(job).unwrap();
        // Give the worker a moment to reach the stage
        thread::sleep(Duration::from_millis(50));
        handle.cancel();

        assert_eq!(handle.wait(), JobStatus::Cancelled);

        let temp_entries: Vec<_> = fs::read_dir(env.root.join("temp")).unwrap().collect();
        assert!(temp_entries.is_empty());
    }

    #[test]
    fn keep_media_retains_completed_download() {
        let env = test_env();
        let mut settings = env.settings.clone();
        settings.download.keep_media = true;

        let runner = full_fake_runner();
        let controller = JobController::with_runner(runner);
        let job = TranscriptionJob::new(
            InputSource::Url("https://youtu.be/abc123".to_string()),
            settings,
        );

        let handle = controller.submit(job).unwrap();
        assert_eq!(handle.wait(), JobStatus::Succeeded);

        let output = env.root.join("output");
        assert!(output.join("My Talk.mp3").is_file());
        assert!(output.join("My Talk.srt").is_file());
    }

    #[test]
    fn keep_media_retains_download_when_transcribe_fails() {
        let env = test_env();
        let mut settings = env.settings.clone();
        settings.download.keep_media = true;

        // Download completes; the engine then exits non-zero without a
        // completion marker.
        let runner = Arc::new(FakeRunner::new(Box::new(|spec, _cancel, on_event| {
            if spec.tool_name() == "yt-dlp" {
                Ok(fake_download(spec, on_event))
            } else {
                Ok(fail_summary(1))
            }
        })));

        let controller = JobController::with_runner(runner);
        let job = TranscriptionJob::new(
            InputSource::Url("https://youtu.be/abc123".to_string()),
            settings,
        );

        let handle = controller.submit(job).unwrap();
        assert!(matches!(handle.wait(), JobStatus::Failed(_)));

        // The completed download survives the failed transcribe
        assert!(env.root.join("output").join("My Talk.mp3").is_file());
        let temp_entries: Vec<_> = fs::read_dir(env.root.join("temp")).unwrap().collect();
        assert!(temp_entries.is_empty());
    }

    #[test]
    fn job_handle_debug_reports_status() {
        let env = test_env();
        let media = env.root.join("talk.mp4");
        fs::write(&media, b"video").unwrap();

        let controller = JobController::with_runner(full_fake_runner());
        let job = TranscriptionJob::new(InputSource::File(media), env.settings.clone());

        let handle = controller.submit(job).unwrap();
        handle.wait();

        let rendered = format!("{:?}", handle);
        assert!(rendered.contains("JobHandle"));
        assert!(rendered.contains("Succeeded"));
    }

    #[test]
    fn progress_callback_receives_every_update() {
        let env = test_env();
        let media = env.root.join("talk.mp4");
        fs::write(&media, b"video").unwrap();

        // Updates 1% apart, well below the default 20% log step
        let runner = Arc::new(FakeRunner::new(Box::new(|spec, _cancel, on_event| {
            on_event(ProcessEvent::Progress(41));
            on_event(ProcessEvent::Progress(42));
            on_event(ProcessEvent::Progress(43));
            Ok(fake_transcribe(spec, on_event))
        })));

        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let controller = JobController::with_runner(runner).with_progress_callback(Arc::new(
            move |_stage, percent, _message| {
                seen_clone.lock().push(percent);
            },
        ));

        let job = TranscriptionJob::new(InputSource::File(media), env.settings.clone());
        let handle = controller.submit(job).unwrap();
        assert_eq!(handle.wait(), JobStatus::Succeeded);

        let seen = seen.lock();
        for percent in [41, 42, 43] {
            assert!(seen.contains(&percent), "missing update {}%", percent);
        }
    }

    #[test]
    fn keep_media_does_not_retain_partial_download() {
        let env = test_env();
        let mut settings = env.settings.clone();
        settings.download.keep_media = true;

        let runner = Arc::new(FakeRunner::new(Box::new(|spec, _cancel, _on_event| {
            let o_pos = spec.args.iter().position(|a| a == "-o").unwrap();
            let media_dir = PathBuf::from(&spec.args[o_pos + 1])
                .parent()
                .unwrap()
                .to_path_buf();
            fs::create_dir_all(&media_dir).unwrap();
            fs::write(media_dir.join("My Talk.mp3.part"), b"partial").unwrap();
            Ok(fail_summary(1))
        })));

        let controller = JobController::with_runner(runner);
        let job = TranscriptionJob::new(
            InputSource::Url("https://youtu.be/abc123".to_string()),
            settings,
        );

        let handle = controller.submit(job).unwrap();
        assert!(matches!(handle.wait(), JobStatus::Failed(_)));

        // Partial media removed with the work dir, nothing kept
        let outputs: Vec<_> = fs::read_dir(env.root.join("output")).unwrap().collect();
        assert!(outputs.is_empty());
        let temp_entries: Vec<_> = fs::read_dir(env.root.join("temp")).unwrap().collect();
        assert!(temp_entries.is_empty());
    }
}
