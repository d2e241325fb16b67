//! Directory scanning: find the files of one folder that may be organized.

use crate::events::EventSink;
use crate::file_category::extension_of;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// A candidate file found while scanning a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path of the file in its original location.
    pub path: PathBuf,
    /// File name exactly as stored on disk; used for every path operation.
    pub file_name: OsString,
    /// Printable form of the file name, for log lines only.
    pub name: String,
    /// Lowercase extension including the leading dot, or empty.
    pub extension: String,
}

/// Reasons a folder could not be scanned at all.
#[derive(Debug)]
pub enum ScanError {
    /// The folder does not exist or is not a directory.
    NotFound(PathBuf),
    /// The folder exists but listing it failed.
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::NotFound(path) => write!(f, "{} not found", path.display()),
            ScanError::Unreadable { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::NotFound(_) => None,
            ScanError::Unreadable { source, .. } => Some(source),
        }
    }
}

/// Lists the regular files of `folder` that are eligible for organizing.
///
/// Subdirectories, including symlinked ones, are ignored. Files whose
/// absolute path is in `protected_paths`, or whose extension is in
/// `protected_extensions`, are left out and reported with a SKIP event.
/// Entries are returned sorted by name so that runs are reproducible.
pub fn scan<S: EventSink>(
    folder: &Path,
    protected_paths: &HashSet<PathBuf>,
    protected_extensions: &HashSet<String>,
    sink: &S,
) -> Result<Vec<FileEntry>, ScanError> {
    if !folder.is_dir() {
        return Err(ScanError::NotFound(folder.to_path_buf()));
    }

    let listing = fs::read_dir(folder).map_err(|e| ScanError::Unreadable {
        path: folder.to_path_buf(),
        source: e,
    })?;

    let mut entries = Vec::new();
    for entry in listing.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let name = file_name.to_string_lossy().to_string();
        let absolute = std::path::absolute(&path).unwrap_or_else(|_| path.clone());

        if protected_paths.contains(&absolute) {
            sink.skip(format!("Skipped script file: {}", name));
            continue;
        }

        let extension = extension_of(Path::new(&file_name));
        if protected_extensions.contains(&extension) {
            sink.skip(format!("Skipped {}: protected extension", name));
            continue;
        }

        entries.push(FileEntry {
            path: absolute,
            file_name,
            name,
            extension,
        });
    }

    entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(entries)
}
