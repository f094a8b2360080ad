//! Compiled stage invocation: one external process to run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::StageKind;

/// A fully compiled external-process invocation for one pipeline stage.
///
/// Produced by the configuration compiler, consumed by the process
/// supervisor. Arguments are passed as an argv vector (no shell), so
/// values are stored unescaped; `display_command` quotes for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Stage kind this invocation belongs to.
    pub kind: StageKind,
    /// Absolute path to the executable.
    pub program: PathBuf,
    /// Ordered command-line arguments.
    pub args: Vec<String>,
    /// Extra environment variables for the child process.
    pub env: Vec<(String, String)>,
    /// Working directory, or inherit when `None`.
    pub current_dir: Option<PathBuf>,
    /// Whether failure of this stage aborts the whole pipeline.
    pub fatal: bool,
}

impl StageSpec {
    /// Create a spec with no environment overrides and inherited cwd.
    pub fn new(kind: StageKind, program: PathBuf, args: Vec<String>) -> Self {
        Self {
            kind,
            program,
            args,
            env: Vec::new(),
            current_dir: None,
            fatal: true,
        }
    }

    /// Render the invocation as a single shell-quoted line for logging.
    pub fn display_command(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(shell_quote(&self.program.to_string_lossy()));
        for arg in &self.args {
            parts.push(shell_quote(arg));
        }
        parts.join(" ")
    }

    /// Name of the tool, for error messages.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }
}

/// Quote an argument for human-readable display.
fn shell_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }
    if arg.contains(' ') || arg.contains('"') || arg.contains('\'') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}
