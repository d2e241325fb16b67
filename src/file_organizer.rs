/// Moving files into category folders and back again.
///
/// This module performs the filesystem side of organizing: it computes the
/// destination of a scanned file, creates the category folder when needed,
/// moves the file without ever overwriting anything, and hands back a
/// [`MoveRecord`] that is enough to put the file back later.
use crate::events::EventSink;
use crate::file_category::Classification;
use crate::scanner::FileEntry;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Records a single completed move so that it can be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Where the file lives now.
    pub new_path: PathBuf,
    /// Where the file lived before it was moved.
    pub original_path: PathBuf,
}

/// Errors that can occur while moving a single file.
#[derive(Debug)]
pub enum MoveError {
    /// The OS refused access to the file or a directory on its path.
    AccessDenied { path: PathBuf },
    /// Failed to create a category (or original parent) directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The move itself failed.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Something already occupies the target path.
    DestinationExists { path: PathBuf },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied { path } => write!(f, "Access denied: {}", path.display()),
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DestinationExists { path } => {
                write!(f, "{} already exists", path.display())
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// Result type for move operations.
pub type MoveResult<T> = Result<T, MoveError>;

/// What happened when a record was replayed backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The file is back at its original path.
    Restored,
    /// The file was no longer where the record says it was.
    Missing,
    /// The file could not be moved back.
    Failed,
}

/// Moves files into category directories and restores them.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Returns where `entry` would end up inside `folder` for `category`.
    pub fn destination_for(folder: &Path, category: &str, entry: &FileEntry) -> PathBuf {
        folder.join(category).join(&entry.file_name)
    }

    /// Moves one scanned file into its category folder under `folder`.
    ///
    /// Never overwrites: when the destination already exists the file is left
    /// in place and a SKIP event is emitted. In dry-run mode the move is only
    /// announced. Returns a record only for a real, successful move; every
    /// failure is reported through `sink` and yields `None`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use foldersort::file_category::{classify, ExtensionTable};
    /// use foldersort::file_organizer::FileOrganizer;
    /// use foldersort::scanner::FileEntry;
    /// use std::ffi::OsString;
    /// use std::path::{Path, PathBuf};
    ///
    /// let (tx, _rx) = std::sync::mpsc::channel();
    /// let entry = FileEntry {
    ///     path: PathBuf::from("/home/me/Downloads/report.pdf"),
    ///     file_name: OsString::from("report.pdf"),
    ///     name: "report.pdf".to_string(),
    ///     extension: ".pdf".to_string(),
    /// };
    /// let classification = classify(&entry.extension, &ExtensionTable::new());
    /// let record = FileOrganizer::move_entry(
    ///     &entry,
    ///     Path::new("/home/me/Downloads"),
    ///     &classification,
    ///     false,
    ///     &tx,
    /// );
    /// if let Some(record) = record {
    ///     println!("{} -> {}", record.original_path.display(), record.new_path.display());
    /// }
    /// ```
    pub fn move_entry<S: EventSink>(
        entry: &FileEntry,
        folder: &Path,
        classification: &Classification,
        dry_run: bool,
        sink: &S,
    ) -> Option<MoveRecord> {
        // The file may have vanished between scanning and moving.
        if !entry.path.is_file() {
            return None;
        }

        let category = &classification.category;
        let destination = Self::destination_for(folder, category, entry);

        if destination.exists() {
            sink.skip(format!(
                "Skipped {}: already exists in {}",
                entry.name, category
            ));
            return None;
        }

        if dry_run {
            sink.success(format!("[DRY] {} -> {}", entry.name, category));
            return None;
        }

        match Self::move_to_category(entry, folder, classification, sink) {
            Ok(record) => {
                sink.success(format!("Moved {} -> {}", entry.name, category));
                Some(record)
            }
            Err(MoveError::AccessDenied { .. }) => {
                sink.error(format!("Access Denied: {}", entry.name));
                None
            }
            Err(e) => {
                sink.error(format!("Failed to move {}: {}", entry.name, e));
                None
            }
        }
    }

    /// Creates the category directory if needed and moves the file into it.
    ///
    /// A dynamic category is announced as soon as its directory exists, even
    /// if the move that follows fails.
    fn move_to_category<S: EventSink>(
        entry: &FileEntry,
        folder: &Path,
        classification: &Classification,
        sink: &S,
    ) -> MoveResult<MoveRecord> {
        let category = &classification.category;
        let category_path = folder.join(category);
        if !category_path.is_dir() {
            Self::create_dir(&category_path)?;
            if classification.is_dynamic {
                let label = if entry.extension.is_empty() {
                    "(no extension)".to_string()
                } else {
                    entry.extension.to_uppercase()
                };
                sink.info(format!("Created {} for {}", category, label));
            }
        }

        let destination_path = Self::destination_for(folder, category, entry);
        Self::relocate(&entry.path, &destination_path)?;

        Ok(MoveRecord {
            new_path: destination_path,
            original_path: entry.path.clone(),
        })
    }

    /// Moves the file of `record` back to where it came from.
    ///
    /// A file that is no longer at `record.new_path` is reported as SKIP and
    /// treated as handled. Existing files at the original path are never
    /// overwritten.
    pub fn restore<S: EventSink>(record: &MoveRecord, sink: &S) -> RestoreOutcome {
        if !record.new_path.exists() {
            sink.skip(format!(
                "Undo skipped: {} missing.",
                record.new_path.display()
            ));
            return RestoreOutcome::Missing;
        }

        match Self::move_back(record) {
            Ok(()) => {
                let name = record
                    .original_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                sink.success(format!("Restored {}", name));
                RestoreOutcome::Restored
            }
            Err(e) => {
                sink.error(format!(
                    "Undo failed for {}: {}",
                    record.original_path.display(),
                    e
                ));
                RestoreOutcome::Failed
            }
        }
    }

    fn move_back(record: &MoveRecord) -> MoveResult<()> {
        if let Some(parent) = record.original_path.parent()
            && !parent.is_dir()
        {
            Self::create_dir(parent)?;
        }

        if record.original_path.exists() {
            return Err(MoveError::DestinationExists {
                path: record.original_path.clone(),
            });
        }

        Self::relocate(&record.new_path, &record.original_path)
    }

    fn create_dir(path: &Path) -> MoveResult<()> {
        fs::create_dir_all(path).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => MoveError::AccessDenied {
                path: path.to_path_buf(),
            },
            _ => MoveError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })
    }

    /// Renames `source` to `destination`, copying across filesystems when a
    /// plain rename is not possible.
    fn relocate(source: &Path, destination: &Path) -> MoveResult<()> {
        let result = match fs::rename(source, destination) {
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                Self::copy_then_remove(source, destination)
            }
            other => other,
        };

        result.map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => MoveError::AccessDenied {
                path: source.to_path_buf(),
            },
            _ => MoveError::FileMoveFailure {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                source_error: e,
            },
        })
    }

    fn copy_then_remove(source: &Path, destination: &Path) -> std::io::Result<()> {
        fs::copy(source, destination)?;
        if let Err(e) = fs::remove_file(source) {
            // Leave exactly one copy behind.
            let _ = fs::remove_file(destination);
            return Err(e);
        }
        Ok(())
    }
}
