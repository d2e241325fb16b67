/// Undo functionality for reverting the last organize run.
///
/// The ledger holds the moves of the most recent real run and nothing else.
/// It lives in memory only: a new run replaces it and an undo consumes it.
use crate::events::{EventSink, Phase};
use crate::file_organizer::{FileOrganizer, MoveRecord, RestoreOutcome};
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// The moves of the last completed organize run, oldest first.
#[derive(Debug, Clone, Default)]
pub struct UndoLedger {
    records: Vec<MoveRecord>,
    recorded_at: Option<DateTime<Local>>,
}

impl UndoLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards whatever was recorded before.
    pub fn clear(&mut self) {
        self.records.clear();
        self.recorded_at = None;
    }

    /// Replaces the ledger with the records of a finished run.
    pub fn replace(&mut self, records: Vec<MoveRecord>) {
        self.recorded_at = if records.is_empty() {
            None
        } else {
            Some(Local::now())
        };
        self.records = records;
    }

    /// Removes and returns every record, leaving the ledger empty.
    pub fn take(&mut self) -> Vec<MoveRecord> {
        self.recorded_at = None;
        std::mem::take(&mut self.records)
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the current records were stored, if there are any.
    pub fn recorded_at(&self) -> Option<DateTime<Local>> {
        self.recorded_at
    }
}

/// Represents the result of an undo run.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that could not be moved back.
    pub failed_restores: Vec<PathBuf>,
    /// Files that were no longer where the ledger said.
    pub skipped_files: Vec<PathBuf>,
}

impl UndoReport {
    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// Replays a ledger backwards, most recent move first.
///
/// An empty ledger is a no-op that only emits a SKIP line. Otherwise every
/// record is processed regardless of earlier failures, progress is reported
/// after each one, and the ledger is left empty afterwards so the same run
/// can never be undone twice.
///
/// # Examples
///
/// ```no_run
/// use foldersort::undo::{undo, UndoLedger};
///
/// let (tx, _rx) = std::sync::mpsc::channel();
/// let mut ledger = UndoLedger::new();
/// let report = undo(&mut ledger, &tx);
/// assert_eq!(report.total_processed(), 0);
/// ```
pub fn undo<S: EventSink>(ledger: &mut UndoLedger, sink: &S) -> UndoReport {
    let mut report = UndoReport::default();
    if ledger.is_empty() {
        sink.skip("No operations to undo.");
        return report;
    }

    sink.phase(Phase::Moving);
    sink.progress(0.0);

    let records = ledger.take();
    let total = records.len();
    for (idx, record) in records.iter().rev().enumerate() {
        match FileOrganizer::restore(record, sink) {
            RestoreOutcome::Restored => report.restored_files += 1,
            RestoreOutcome::Missing => report.skipped_files.push(record.new_path.clone()),
            RestoreOutcome::Failed => report.failed_restores.push(record.new_path.clone()),
        }
        sink.progress((idx + 1) as f64 / total as f64);
    }

    sink.phase(Phase::Done);
    report
}
