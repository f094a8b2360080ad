//! Archive unpacking for tool installation.
//!
//! Supports `.zip` and `.tar.gz`/`.tgz` archives plus single-file
//! downloads (standalone binaries like the download helper).

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;

/// Errors while unpacking a downloaded archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error while unpacking: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive is empty: {0}")]
    Empty(PathBuf),
}

/// Archive kind, detected from the download URL / file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    /// Not an archive; the download is the executable itself.
    PlainFile,
}

impl ArchiveKind {
    /// Detect the kind from a URL or file name.
    pub fn detect(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            ArchiveKind::Zip
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            ArchiveKind::TarGz
        } else {
            ArchiveKind::PlainFile
        }
    }
}

/// Unpack `archive` into `dest` and return the content root.
///
/// When the archive holds a single top-level directory (the usual
/// release layout), that directory is the returned root; otherwise
/// `dest` itself is. A plain file is copied into `dest` under
/// `plain_name`.
pub fn unpack(
    archive: &Path,
    kind: ArchiveKind,
    dest: &Path,
    plain_name: &str,
) -> Result<PathBuf, ArchiveError> {
    fs::create_dir_all(dest)?;

    match kind {
        ArchiveKind::Zip => {
            let file = File::open(archive)?;
            let mut zip = zip::ZipArchive::new(file)?;
            zip.extract(dest)?;
        }
        ArchiveKind::TarGz => {
            let file = File::open(archive)?;
            let mut tar = tar::Archive::new(GzDecoder::new(file));
            tar.unpack(dest)?;
        }
        ArchiveKind::PlainFile => {
            fs::copy(archive, dest.join(plain_name))?;
        }
    }

    content_root(dest)
}

/// Resolve the content root: flatten a single top-level directory.
fn content_root(dest: &Path) -> Result<PathBuf, ArchiveError> {
    let entries: Vec<_> = fs::read_dir(dest)?.collect::<Result<_, _>>()?;
    if entries.is_empty() {
        return Err(ArchiveError::Empty(dest.to_path_buf()));
    }
    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        Ok(entries[0].path())
    } else {
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn detects_archive_kinds() {
        assert_eq!(
            ArchiveKind::detect("https://example.com/tool_r245.4_windows.zip"),
            ArchiveKind::Zip
        );
        assert_eq!(
            ArchiveKind::detect("tool_linux.tar.gz"),
            ArchiveKind::TarGz
        );
        assert_eq!(ArchiveKind::detect("release.tgz"), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::detect("yt-dlp"), ArchiveKind::PlainFile);
    }

    #[test]
    fn plain_file_is_copied_under_given_name() {
        let dir = tempdir().unwrap();
        let download = dir.path().join("download.bin");
        fs::write(&download, b"#!/bin/sh\necho hi\n").unwrap();

        let dest = dir.path().join("unpacked");
        let root = unpack(&download, ArchiveKind::PlainFile, &dest, "yt-dlp").unwrap();

        assert_eq!(root, dest);
        assert!(dest.join("yt-dlp").exists());
    }

    #[test]
    fn zip_with_single_dir_is_flattened() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("tool.zip");

        {
            let file = File::create(&archive_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.add_directory("tool-1.0/", options).unwrap();
            zip.start_file("tool-1.0/tool", options).unwrap();
            zip.write_all(b"binary").unwrap();
            zip.finish().unwrap();
        }

        let dest = dir.path().join("unpacked");
        let root = unpack(&archive_path, ArchiveKind::Zip, &dest, "tool").unwrap();

        assert_eq!(root, dest.join("tool-1.0"));
        assert!(root.join("tool").exists());
    }

    #[test]
    fn tar_gz_round_trip() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("tool.tar.gz");

        {
            let file = File::create(&archive_path).unwrap();
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            let mut tar = tar::Builder::new(encoder);
            let payload = b"binary";
            let mut header = tar::Header::new_gnu();
            header.set_size(payload.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            tar.append_data(&mut header, "tool", payload.as_slice())
                .unwrap();
            tar.into_inner().unwrap().finish().unwrap();
        }

        let dest = dir.path().join("unpacked");
        let root = unpack(&archive_path, ArchiveKind::TarGz, &dest, "tool").unwrap();

        // Single top-level file, no flattening
        assert_eq!(root, dest);
        assert!(root.join("tool").exists());
    }
}
