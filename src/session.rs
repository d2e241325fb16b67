//! The organize run: scan every job folder, then classify and move each file.
//!
//! A run walks through `Scanning -> Moving -> Done` on its own. Problems with
//! a folder or a file are logged and the run carries on; there is no error a
//! run can fail with.

use crate::events::{EventSink, Phase};
use crate::file_category::{ExtensionTable, classify};
use crate::file_organizer::{FileOrganizer, MoveRecord};
use crate::scanner::{FileEntry, ScanError, scan};
use crate::undo::UndoLedger;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Summary used when a run finds nothing to do.
pub const NO_FILES_SUMMARY: &str = "No files queued for processing.";

/// One folder to organize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Human-readable name used in log lines.
    pub label: String,
    pub folder: PathBuf,
    /// Lowercase, dot-prefixed extensions that must never be moved.
    pub protected_extensions: HashSet<String>,
}

impl Job {
    /// Creates a job with no protected extensions.
    pub fn new(label: impl Into<String>, folder: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            folder: folder.into(),
            protected_extensions: HashSet::new(),
        }
    }

    /// Adds protected extensions, normalizing them to lowercase.
    pub fn protecting<I, T>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.protected_extensions
            .extend(extensions.into_iter().map(|ext| ext.as_ref().to_lowercase()));
        self
    }
}

/// Flags that shape a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub dry_run: bool,
    pub delete_empty_dirs: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No eligible files were found; the ledger was left alone.
    NoOp,
    /// Files were processed (moved or previewed).
    Completed,
}

/// What a run reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub status: SessionStatus,
    /// Eligible files found across all jobs.
    pub total_files: usize,
    /// Files actually moved; always zero for a dry run.
    pub moved: usize,
    pub dry_run: bool,
    pub summary: String,
}

/// Paths the tool must never move: its own executable and the packaged
/// sibling of it (with or without an `.exe` suffix).
pub fn protected_paths() -> HashSet<PathBuf> {
    let mut paths = HashSet::new();
    if let Ok(exe) = std::env::current_exe() {
        let exe = std::path::absolute(&exe).unwrap_or(exe);
        paths.insert(exe.with_extension("exe"));
        paths.insert(exe.with_extension(""));
        paths.insert(exe);
    }
    paths
}

/// Organizes `jobs` in order, replacing `ledger` with the moves made.
///
/// `completion` is the summary reported when files were processed. The
/// ledger is only touched once at least one eligible file was found; from
/// that point it is emptied before the first move, so a dry run leaves it
/// empty too.
pub fn run<S: EventSink>(
    jobs: &[Job],
    options: SessionOptions,
    rules: &ExtensionTable,
    ledger: &mut UndoLedger,
    completion: &str,
    sink: &S,
) -> SessionResult {
    run_with_protected(
        jobs,
        options,
        rules,
        ledger,
        completion,
        &protected_paths(),
        sink,
    )
}

/// Same as [`run`] with an explicit set of protected paths.
pub fn run_with_protected<S: EventSink>(
    jobs: &[Job],
    options: SessionOptions,
    rules: &ExtensionTable,
    ledger: &mut UndoLedger,
    completion: &str,
    protected: &HashSet<PathBuf>,
    sink: &S,
) -> SessionResult {
    sink.progress(0.0);
    sink.phase(Phase::Scanning);

    let queued = scan_jobs(jobs, protected, sink);
    let total_files: usize = queued.iter().map(|(_, entries)| entries.len()).sum();

    if total_files == 0 {
        sink.skip(NO_FILES_SUMMARY);
        sink.phase(Phase::Done);
        return SessionResult {
            status: SessionStatus::NoOp,
            total_files: 0,
            moved: 0,
            dry_run: options.dry_run,
            summary: NO_FILES_SUMMARY.to_string(),
        };
    }

    sink.phase(Phase::Moving);
    ledger.clear();

    let mut moves: Vec<MoveRecord> = Vec::new();
    let mut processed = 0usize;
    for (job, entries) in &queued {
        for entry in entries {
            let classification = classify(&entry.extension, rules);
            let record = FileOrganizer::move_entry(
                entry,
                &job.folder,
                &classification,
                options.dry_run,
                sink,
            );
            moves.extend(record);
            processed += 1;
            sink.progress(processed as f64 / total_files as f64);
        }

        if options.delete_empty_dirs && !options.dry_run {
            delete_empty_dirs(&job.folder, sink);
        }

        sink.info(format!("--- Finished {} ---", job.folder.display()));
    }

    let moved = moves.len();
    if options.dry_run {
        sink.info("Dry run complete. No files were moved.");
    } else {
        ledger.replace(moves);
        sink.success(format!("Session complete. {} files moved.", moved));
    }

    sink.phase(Phase::Done);
    SessionResult {
        status: SessionStatus::Completed,
        total_files,
        moved,
        dry_run: options.dry_run,
        summary: completion.to_string(),
    }
}

/// Scans each job, keeping only the ones that produced files.
fn scan_jobs<'a, S: EventSink>(
    jobs: &'a [Job],
    protected: &HashSet<PathBuf>,
    sink: &S,
) -> Vec<(&'a Job, Vec<FileEntry>)> {
    let mut queued = Vec::new();
    for job in jobs {
        if !job.folder.is_dir() {
            sink.skip(format!(
                "{} not found at {}.",
                job.label,
                job.folder.display()
            ));
            continue;
        }

        sink.info(format!(
            "--- Starting Organization of {} ---",
            job.folder.display()
        ));

        match scan(&job.folder, protected, &job.protected_extensions, sink) {
            Ok(entries) if !entries.is_empty() => queued.push((job, entries)),
            Ok(_) => sink.skip(format!(
                "No eligible files found in {}.",
                job.folder.display()
            )),
            Err(ScanError::NotFound(path)) => {
                sink.skip(format!("{} not found at {}.", job.label, path.display()));
            }
            Err(e) => sink.error(e.to_string()),
        }
    }
    queued
}

/// Removes empty directories below `base`, deepest first.
///
/// `base` itself is kept. Directories that cannot be read or removed are
/// skipped without complaint. Returns the number of directories removed.
pub fn delete_empty_dirs<S: EventSink>(base: &Path, sink: &S) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(base)
        .min_depth(1)
        .contents_first(true)
        .follow_links(false)
        .into_iter()
        .flatten()
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let is_empty = fs::read_dir(path)
            .map(|mut listing| listing.next().is_none())
            .unwrap_or(false);
        if is_empty && fs::remove_dir(path).is_ok() {
            sink.info(format!("Removed empty folder: {}", path.display()));
            removed += 1;
        }
    }
    removed
}
