//! Dependency provisioner: download, verify, and install external tools.
//!
//! Resolution order for each dependency:
//! 1. already installed under the bin folder
//! 2. primary executable available on `PATH`
//! 3. download the archive (bounded retry), verify, unpack, install
//!
//! Installs are atomic per file (rename into place) and serialized per
//! dependency, so concurrent `ensure` calls for the same tool cannot
//! corrupt the install path.

use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::archive::{self, ArchiveError, ArchiveKind};
use super::manifest::ToolDependency;

/// Retry schedule for downloads: 3 attempts with exponential backoff.
const RETRY_DELAYS: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];
const MAX_ATTEMPTS: usize = 3;

/// Errors from provisioning a tool dependency.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Failed to download {url} after {attempts} attempts: {message}")]
    Download {
        url: String,
        attempts: usize,
        message: String,
    },

    #[error("Checksum mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to unpack archive for {name}: {source}")]
    Unpack {
        name: String,
        source: ArchiveError,
    },

    #[error("Executable missing or empty after install: {path}")]
    MissingExecutable { path: PathBuf },

    #[error("I/O error during provisioning: {0}")]
    Io(#[from] io::Error),
}

/// Where a resolved tool came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    /// Installed under the managed bin folder.
    BinFolder,
    /// Found on the system `PATH`.
    SystemPath,
}

/// A tool that is present and runnable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    /// Dependency name.
    pub name: String,
    /// Absolute path of the primary executable.
    pub primary: PathBuf,
    /// Where it was found.
    pub source: ToolSource,
}

/// Downloads, verifies, and installs external tools into a bin folder.
pub struct Provisioner {
    bin_dir: PathBuf,
    client: reqwest::blocking::Client,
    /// Per-dependency install locks (single-flight per tool name).
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Provisioner {
    /// Create a provisioner installing into `bin_dir`.
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            client: reqwest::blocking::Client::new(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The managed bin folder.
    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Make sure `dep` is available, installing it if necessary.
    pub fn ensure(&self, dep: &ToolDependency) -> Result<ResolvedTool, ProvisionError> {
        let lock = self.lock_for(&dep.name);
        let _guard = lock.lock();

        if let Some(resolved) = self.resolve_installed(dep)? {
            debug!(tool = %dep.name, "already installed");
            return Ok(resolved);
        }

        if let Some(path) = find_on_path(dep.primary_executable()) {
            debug!(tool = %dep.name, path = %path.display(), "found on PATH");
            return Ok(ResolvedTool {
                name: dep.name.clone(),
                primary: path,
                source: ToolSource::SystemPath,
            });
        }

        info!(tool = %dep.name, url = %dep.archive_url, "installing");
        fs::create_dir_all(&self.bin_dir)?;

        let staging = self
            .bin_dir
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!(".provision-{}", dep.name));
        // Stale scratch from a crashed previous run
        if staging.exists() {
            let _ = fs::remove_dir_all(&staging);
        }
        fs::create_dir_all(&staging)?;

        let result = self.install_into(dep, &staging);

        // Partial downloads and unpack scratch are removed on every exit path
        let _ = fs::remove_dir_all(&staging);

        result?;
        self.resolve_installed(dep)?
            .ok_or_else(|| ProvisionError::MissingExecutable {
                path: self.bin_dir.join(dep.primary_executable()),
            })
    }

    /// Download, verify, unpack into `staging`, and move into the bin dir.
    fn install_into(&self, dep: &ToolDependency, staging: &Path) -> Result<(), ProvisionError> {
        let archive_path = staging.join("download");
        self.download_with_retry(&dep.archive_url, &archive_path)?;

        if let Some(ref expected) = dep.sha256 {
            let actual = sha256_file(&archive_path)?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(ProvisionError::ChecksumMismatch {
                    name: dep.name.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        let kind = ArchiveKind::detect(&dep.archive_url);
        let unpack_dir = staging.join("unpacked");
        let root = archive::unpack(&archive_path, kind, &unpack_dir, dep.primary_executable())
            .map_err(|source| ProvisionError::Unpack {
                name: dep.name.clone(),
                source,
            })?;

        install_entries(&root, &self.bin_dir)?;
        for name in &dep.executables {
            set_executable(&self.bin_dir.join(name))?;
        }
        Ok(())
    }

    /// Download `url` to `dest` with bounded retry and backoff.
    fn download_with_retry(&self, url: &str, dest: &Path) -> Result<(), ProvisionError> {
        let mut last_error = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            match self.download_once(url, dest) {
                Ok(()) => return Ok(()),
                Err(message) => {
                    warn!(url, attempt, %message, "download attempt failed");
                    // Never leave a partial download behind
                    let _ = fs::remove_file(dest);
                    last_error = message;
                    if attempt < MAX_ATTEMPTS {
                        thread::sleep(RETRY_DELAYS[attempt - 1]);
                    }
                }
            }
        }

        Err(ProvisionError::Download {
            url: url.to_string(),
            attempts: MAX_ATTEMPTS,
            message: last_error,
        })
    }

    fn download_once(&self, url: &str, dest: &Path) -> Result<(), String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let mut file = File::create(dest).map_err(|e| e.to_string())?;
        response.copy_to(&mut file).map_err(|e| e.to_string())?;
        file.flush().map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Check whether every expected executable is installed and non-empty.
    fn resolve_installed(
        &self,
        dep: &ToolDependency,
    ) -> Result<Option<ResolvedTool>, ProvisionError> {
        for name in &dep.executables {
            let path = self.bin_dir.join(name);
            match fs::metadata(&path) {
                Ok(meta) if meta.len() > 0 => {}
                _ => return Ok(None),
            }
        }
        Ok(Some(ResolvedTool {
            name: dep.name.clone(),
            primary: self.bin_dir.join(dep.primary_executable()),
            source: ToolSource::BinFolder,
        }))
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Move every entry under `root` into `bin_dir`, replacing existing ones.
fn install_entries(root: &Path, bin_dir: &Path) -> Result<(), ProvisionError> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let target = bin_dir.join(entry.file_name());
        if target.exists() {
            if target.is_dir() {
                fs::remove_dir_all(&target)?;
            } else {
                fs::remove_file(&target)?;
            }
        }
        move_entry(&entry.path(), &target)?;
    }
    Ok(())
}

/// Rename, falling back to copy for cross-device moves.
fn move_entry(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            if from.is_dir() {
                copy_dir_all(from, to)?;
                fs::remove_dir_all(from)
            } else {
                fs::copy(from, to)?;
                fs::remove_file(from)
            }
        }
    }
}

fn copy_dir_all(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Set the executable bit (no-op off unix).
#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;
    if path.exists() {
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}

/// SHA-256 of a file, lowercase hex.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Search the system `PATH` for an executable.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    find_in_dirs(name, env::split_paths(&path_var))
}

fn find_in_dirs(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    for dir in dirs {
        let candidate = dir.join(name);
        if let Ok(meta) = fs::metadata(&candidate) {
            if meta.is_file() && meta.len() > 0 {
                return Some(candidate);
            }
        }
    }
    None
}
