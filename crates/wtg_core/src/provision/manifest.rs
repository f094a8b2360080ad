//! Tool dependency manifest.
//!
//! Describes the external tools the pipeline needs and where to fetch
//! them when missing. Entries are immutable once resolved for a run.

use serde::{Deserialize, Serialize};

/// One external tool dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDependency {
    /// Tool name; also the primary executable's file name (sans `.exe`).
    pub name: String,
    /// Archive or single-file download URL.
    pub archive_url: String,
    /// Expected SHA-256 of the download, when pinned.
    pub sha256: Option<String>,
    /// Executables that must exist after installation. The first entry
    /// is the primary executable the compiler invokes.
    pub executables: Vec<String>,
}

impl ToolDependency {
    /// Primary executable name (platform-adjusted).
    pub fn primary_executable(&self) -> &str {
        self.executables
            .first()
            .map(String::as_str)
            .unwrap_or(&self.name)
    }
}

/// Built-in manifest covering the tools the pipeline can bootstrap.
#[derive(Debug, Clone)]
pub struct ToolManifest {
    tools: Vec<ToolDependency>,
}

const ENGINE_NAME: &str = "faster-whisper-xxl";
const DOWNLOADER_NAME: &str = "yt-dlp";

#[cfg(target_os = "windows")]
const ENGINE_URL: &str = "https://github.com/Purfview/whisper-standalone-win/releases/download/Faster-Whisper-XXL/Faster-Whisper-XXL_r245.4_windows.zip";
#[cfg(not(target_os = "windows"))]
const ENGINE_URL: &str = "https://github.com/Purfview/whisper-standalone-win/releases/download/Faster-Whisper-XXL/Faster-Whisper-XXL_r245.4_linux.tar.gz";

#[cfg(target_os = "windows")]
const DOWNLOADER_URL: &str =
    "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp.exe";
#[cfg(not(target_os = "windows"))]
const DOWNLOADER_URL: &str =
    "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp";

#[cfg(target_os = "windows")]
fn exe(name: &str) -> String {
    format!("{}.exe", name)
}

#[cfg(not(target_os = "windows"))]
fn exe(name: &str) -> String {
    name.to_string()
}

impl ToolManifest {
    /// The built-in tool set: transcription engine + downloader.
    pub fn builtin() -> Self {
        Self {
            tools: vec![
                ToolDependency {
                    name: ENGINE_NAME.to_string(),
                    archive_url: ENGINE_URL.to_string(),
                    sha256: None,
                    // The engine archive bundles its own ffmpeg
                    executables: vec![exe(ENGINE_NAME), exe("ffmpeg")],
                },
                ToolDependency {
                    name: DOWNLOADER_NAME.to_string(),
                    archive_url: DOWNLOADER_URL.to_string(),
                    sha256: None,
                    executables: vec![exe(DOWNLOADER_NAME)],
                },
            ],
        }
    }

    /// The transcription engine dependency.
    pub fn engine(&self) -> &ToolDependency {
        self.get(ENGINE_NAME)
            .unwrap_or(&self.tools[0])
    }

    /// The download helper dependency.
    pub fn downloader(&self) -> &ToolDependency {
        self.get(DOWNLOADER_NAME)
            .unwrap_or(&self.tools[1])
    }

    /// Look up a dependency by name.
    pub fn get(&self, name: &str) -> Option<&ToolDependency> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// All dependencies.
    pub fn tools(&self) -> &[ToolDependency] {
        &self.tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_engine_and_downloader() {
        let manifest = ToolManifest::builtin();
        assert_eq!(manifest.engine().name, "faster-whisper-xxl");
        assert_eq!(manifest.downloader().name, "yt-dlp");
        assert_eq!(manifest.tools().len(), 2);
    }

    #[test]
    fn engine_requires_bundled_ffmpeg() {
        let manifest = ToolManifest::builtin();
        assert_eq!(manifest.engine().executables.len(), 2);
        assert!(manifest.engine().executables[1].starts_with("ffmpeg"));
    }

    #[test]
    fn primary_executable_is_first_entry() {
        let dep = ToolDependency {
            name: "tool".to_string(),
            archive_url: "https://example.com/t.zip".to_string(),
            sha256: None,
            executables: vec!["tool-bin".to_string(), "helper".to_string()],
        };
        assert_eq!(dep.primary_executable(), "tool-bin");
    }
}
