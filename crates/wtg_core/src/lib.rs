//! WTG Core - Backend logic for Whisper Transcriber GUI
//!
//! Job orchestration for an external transcription engine and download
//! helper, with zero UI dependencies: dependency provisioning,
//! configuration compilation, process supervision, and the job pipeline.
//! The UI supplies a settings snapshot and consumes log/progress events.

pub mod command;
pub mod config;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod process;
pub mod provision;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
