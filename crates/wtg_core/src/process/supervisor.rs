//! Process supervisor: spawn, stream, cancel.
//!
//! Runs one external process at a time for a pipeline stage:
//! - Executes program + args directly (no shell)
//! - Streams stdout/stderr line by line on reader threads
//! - Observes a `CancelToken` between lines
//! - On cancellation, asks the process to stop (SIGTERM on unix), waits a
//!   bounded grace period, then force-kills
//!
//! After `run` returns, the OS process is guaranteed to be dead.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::models::StageSpec;

use super::events::{parse_progress, CancelToken, ExitSummary, ProcessError, ProcessEvent};

/// Default grace period between the stop request and the force-kill.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

/// Seam between the pipeline and real process execution.
///
/// The production implementation is [`ProcessSupervisor`]; tests drive the
/// pipeline with a scripted fake.
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion, streaming events to `on_event`.
    fn run(
        &self,
        spec: &StageSpec,
        cancel: &CancelToken,
        on_event: &mut dyn FnMut(ProcessEvent),
    ) -> Result<ExitSummary, ProcessError>;
}

/// Real `CommandRunner` backed by `std::process`.
pub struct ProcessSupervisor {
    /// Time allowed between the stop request and the force-kill.
    grace: Duration,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self {
            grace: DEFAULT_GRACE,
        }
    }

    /// Override the cancellation grace period.
    pub fn with_grace(grace: Duration) -> Self {
        Self { grace }
    }

    /// Ask the child to stop without killing it outright.
    #[cfg(unix)]
    fn request_stop(child: &Child) {
        let pid = child.id() as i32;
        debug!(pid, "sending SIGTERM");
        unsafe {
            libc::kill(pid, libc::SIGTERM);
        }
    }

    #[cfg(not(unix))]
    fn request_stop(_child: &Child) {
        // No graceful signal available; the grace loop falls through to kill().
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ProcessSupervisor {
    fn run(
        &self,
        spec: &StageSpec,
        cancel: &CancelToken,
        on_event: &mut dyn FnMut(ProcessEvent),
    ) -> Result<ExitSummary, ProcessError> {
        let program = spec.program.to_string_lossy().into_owned();
        let start = Instant::now();

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if let Some(ref dir) = spec.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ProcessError::from_spawn(&program, e))?;
        debug!(pid = child.id(), program = %program, "process spawned");

        let (tx, rx) = mpsc::channel::<(String, bool)>();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut readers = Vec::new();
        if let Some(stdout) = stdout {
            let tx = tx.clone();
            readers.push(thread::spawn(move || {
                for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                    if tx.send((line, false)).is_err() {
                        break;
                    }
                }
            }));
        }
        if let Some(stderr) = stderr {
            let tx = tx.clone();
            readers.push(thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    if tx.send((line, true)).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(tx);

        let mut cancelled = false;
        let mut cancel_at: Option<Instant> = None;

        // Pump lines until both pipes close. Cancellation is checked between
        // lines; a process that ignores the stop request is killed once the
        // grace period elapses.
        loop {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok((line, is_stderr)) => {
                    if let Some(percent) = parse_progress(&line) {
                        on_event(ProcessEvent::Progress(percent));
                    }
                    on_event(ProcessEvent::OutputLine { line, is_stderr });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if !cancelled && cancel.is_cancelled() {
                cancelled = true;
                cancel_at = Some(Instant::now());
                Self::request_stop(&child);
            }

            if let Some(at) = cancel_at {
                if at.elapsed() >= self.grace {
                    debug!(pid = child.id(), "grace period elapsed, killing");
                    let _ = child.kill();
                    cancel_at = None;
                }
            }
        }

        for reader in readers {
            let _ = reader.join();
        }

        // Pipes are closed but the process may still be running (e.g. it
        // closed its fds, or ignored the stop request). Enforce the grace
        // period before the final kill, then reap.
        if cancelled {
            let deadline = cancel_at
                .map(|at| at + self.grace)
                .unwrap_or_else(Instant::now);
            loop {
                match child.try_wait() {
                    Ok(Some(_)) => break,
                    Ok(None) => {
                        if Instant::now() >= deadline {
                            let _ = child.kill();
                            break;
                        }
                        thread::sleep(Duration::from_millis(25));
                    }
                    Err(_) => break,
                }
            }
        }

        let status = child.wait().map_err(|e| ProcessError::Io {
            program: program.clone(),
            source: e,
        })?;

        let summary = ExitSummary {
            exit_code: status.code(),
            success: status.success() && !cancelled,
            cancelled,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            program = %program,
            exit_code = ?summary.exit_code,
            cancelled = summary.cancelled,
            "process finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageKind;
    use std::path::PathBuf;

    fn spec(program: &str, args: &[&str]) -> StageSpec {
        StageSpec::new(
            StageKind::Transcribe,
            PathBuf::from(program),
            args.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn runs_and_streams_output() {
        let supervisor = ProcessSupervisor::new();
        let mut lines = Vec::new();
        let summary = supervisor
            .run(
                &spec("echo", &["hello world"]),
                &CancelToken::new(),
                &mut |event| {
                    if let ProcessEvent::OutputLine { line, is_stderr } = event {
                        assert!(!is_stderr);
                        lines.push(line);
                    }
                },
            )
            .unwrap();

        assert!(summary.success);
        assert_eq!(summary.exit_code, Some(0));
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn missing_program_is_launch_error() {
        let supervisor = ProcessSupervisor::new();
        let result = supervisor.run(
            &spec("definitely_not_a_real_program_xyz", &[]),
            &CancelToken::new(),
            &mut |_| {},
        );
        assert!(matches!(result, Err(ProcessError::NotFound { .. })));
    }

    #[test]
    fn nonzero_exit_is_not_success() {
        let supervisor = ProcessSupervisor::new();
        let summary = supervisor
            .run(
                &spec("sh", &["-c", "exit 3"]),
                &CancelToken::new(),
                &mut |_| {},
            )
            .unwrap();
        assert!(!summary.success);
        assert_eq!(summary.exit_code, Some(3));
    }

    #[test]
    fn reports_progress_events() {
        let supervisor = ProcessSupervisor::new();
        let mut progress = Vec::new();
        supervisor
            .run(
                &spec("sh", &["-c", "echo 'done 40%'; echo 'done 80%'"]),
                &CancelToken::new(),
                &mut |event| {
                    if let ProcessEvent::Progress(p) = event {
                        progress.push(p);
                    }
                },
            )
            .unwrap();
        assert_eq!(progress, vec![40, 80]);
    }

    #[test]
    #[cfg(unix)]
    fn cancel_stops_long_running_process() {
        let supervisor = ProcessSupervisor::with_grace(Duration::from_millis(200));
        let cancel = CancelToken::new();
        cancel.cancel();

        let start = Instant::now();
        let summary = supervisor
            .run(&spec("sleep", &["30"]), &cancel, &mut |_| {})
            .unwrap();

        assert!(summary.cancelled);
        assert!(!summary.success);
        // Far below the 30s the process would have run
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
