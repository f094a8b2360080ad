//! Error types for the job pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Stage → Operation → Detail

use std::io;

use thiserror::Error;

use crate::command::CompileError;
use crate::process::ProcessError;
use crate::provision::ProvisionError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage failed during execution.
    #[error("Job '{job_name}' failed at stage '{stage_name}': {source}")]
    StageFailed {
        job_name: String,
        stage_name: String,
        #[source]
        source: StageError,
    },

    /// The configuration cannot be compiled into a runnable command.
    /// Raised before any process starts; no side effects have occurred.
    #[error("Invalid configuration: {}", conflicts.join("; "))]
    InvalidConfiguration { conflicts: Vec<String> },

    /// A required external tool could not be provisioned.
    #[error("Job '{job_name}' needs '{tool}' which could not be provisioned: {source}")]
    DependencyUnavailable {
        job_name: String,
        tool: String,
        #[source]
        source: ProvisionError,
    },

    /// A run is already active; the new job was rejected untouched.
    #[error("A job is already running")]
    JobAlreadyRunning,

    /// Pipeline was cancelled. A clean terminal state, not a defect.
    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },

    /// Failed to set up the job (create directories, open log, etc.).
    #[error("Job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    /// Create a stage failed error.
    pub fn stage_failed(
        job_name: impl Into<String>,
        stage_name: impl Into<String>,
        source: StageError,
    ) -> Self {
        Self::StageFailed {
            job_name: job_name.into(),
            stage_name: stage_name.into(),
            source,
        }
    }

    /// Create a dependency unavailable error.
    pub fn dependency_unavailable(
        job_name: impl Into<String>,
        tool: impl Into<String>,
        source: ProvisionError,
    ) -> Self {
        Self::DependencyUnavailable {
            job_name: job_name.into(),
            tool: tool.into(),
            source,
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }
}

impl From<CompileError> for PipelineError {
    fn from(err: CompileError) -> Self {
        let CompileError::InvalidConfiguration { conflicts } = err;
        PipelineError::InvalidConfiguration { conflicts }
    }
}

/// Error from a pipeline stage with operation context.
#[derive(Error, Debug)]
pub enum StageError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// The stage's process could not be launched at all.
    #[error("Failed to launch process: {source}")]
    LaunchFailed {
        #[source]
        source: ProcessError,
    },

    /// The stage's process ran and failed.
    #[error("{tool} failed with exit code {exit_code}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        /// Last output lines, for diagnosis.
        tail: Vec<String>,
    },

    /// The stage was interrupted by cancellation.
    #[error("Stage cancelled")]
    Cancelled,

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create a command failed error.
    pub fn command_failed(tool: impl Into<String>, exit_code: i32, tail: Vec<String>) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            tail,
        }
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }
}

impl From<ProcessError> for StageError {
    fn from(source: ProcessError) -> Self {
        StageError::LaunchFailed { source }
    }
}

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
