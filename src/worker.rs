//! Background execution of organize and undo runs.
//!
//! [`Organizer`] is the engine object a front end talks to. It owns the
//! extension rules, the session options and the undo ledger, and runs every
//! organize or undo on a worker thread so the caller never blocks. Only one
//! run may be in flight; further start requests are answered with a SKIP
//! line and [`Start::Rejected`].

use crate::events::{Event, EventSink, Phase};
use crate::file_category::ExtensionTable;
use crate::session::{self, Job, SessionOptions, SessionResult};
use crate::undo::{self, UndoLedger, UndoReport};
use crate::user_folders;
use chrono::{DateTime, Local};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};

/// Summary reported once an undo run has finished.
pub const UNDO_SUMMARY: &str = "Last operation has been undone.";

/// What a finished worker run produced.
#[derive(Debug)]
pub enum RunOutcome {
    Organize(SessionResult),
    Undo(UndoReport),
    /// The worker thread panicked before producing a result.
    Aborted,
}

/// Answer to a start request.
#[derive(Debug)]
pub enum Start {
    /// The run is executing; join the handle to wait for it.
    Started(JoinHandle<RunOutcome>),
    /// Nothing was started; the reason has been logged.
    Rejected,
}

impl Start {
    pub fn is_started(&self) -> bool {
        matches!(self, Start::Started(_))
    }

    /// Blocks until the run finishes. Returns `None` if nothing was started.
    pub fn wait(self) -> Option<RunOutcome> {
        match self {
            Start::Started(handle) => Some(handle.join().unwrap_or(RunOutcome::Aborted)),
            Start::Rejected => None,
        }
    }
}

/// Clears the busy flag and returns the front end to `Idle` when a run ends,
/// however it ends.
struct BusyGuard {
    busy: Arc<AtomicBool>,
    events: Sender<Event>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.events.phase(Phase::Idle);
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// The organize engine: rules, options, ledger and the single-run guard.
pub struct Organizer {
    rules: ExtensionTable,
    options: SessionOptions,
    ledger: Arc<Mutex<UndoLedger>>,
    busy: Arc<AtomicBool>,
    events: Sender<Event>,
}

impl Organizer {
    /// Creates an engine that reports to `events`.
    pub fn new(rules: ExtensionTable, options: SessionOptions, events: Sender<Event>) -> Self {
        Self {
            rules,
            options,
            ledger: Arc::new(Mutex::new(UndoLedger::new())),
            busy: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    pub fn rules(&self) -> &ExtensionTable {
        &self.rules
    }

    /// Replaces the rules used by runs started from now on.
    pub fn set_rules(&mut self, rules: ExtensionTable) {
        self.rules = rules;
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Replaces the options used by runs started from now on.
    pub fn set_options(&mut self, options: SessionOptions) {
        self.options = options;
    }

    /// True while an organize or undo run is executing.
    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Number of moves the next undo would revert, and when they were made.
    ///
    /// Returns `None` while a run holds the ledger.
    pub fn undo_status(&self) -> Option<(usize, Option<DateTime<Local>>)> {
        let ledger = match self.ledger.try_lock() {
            Ok(ledger) => ledger,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some((ledger.len(), ledger.recorded_at()))
    }

    fn lock_ledger(&self) -> MutexGuard<'_, UndoLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the busy flag. Returns false if a run is already active.
    fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Organizes a single user-chosen folder.
    pub fn organize_folder(&self, folder: &Path) -> Start {
        if self.is_running() {
            self.events.skip("Operation already running.");
            return Start::Rejected;
        }
        if !folder.is_dir() {
            self.events.error("Selected folder is invalid.");
            return Start::Rejected;
        }
        self.start_organize(
            vec![user_folders::selected_folder_job(folder)],
            user_folders::SELECTED_FOLDER_SUMMARY,
        )
    }

    /// Organizes the six standard folders under `home`.
    pub fn organize_user_folders(&self, home: &Path) -> Start {
        self.start_organize(
            user_folders::standard_jobs(home),
            user_folders::STANDARD_FOLDERS_SUMMARY,
        )
    }

    /// Starts an organize run over `jobs` on the worker thread.
    ///
    /// Rules and options are captured now; later changes do not affect the
    /// run. `completion` is reported when the run processed files.
    pub fn start_organize(&self, jobs: Vec<Job>, completion: impl Into<String>) -> Start {
        if !self.try_claim() {
            self.events.skip("Operation already running.");
            return Start::Rejected;
        }

        let rules = self.rules.clone();
        let options = self.options;
        let completion = completion.into();
        let ledger = Arc::clone(&self.ledger);
        self.spawn(move |events| {
            let mut ledger = ledger.lock().unwrap_or_else(PoisonError::into_inner);
            let result = session::run(&jobs, options, &rules, &mut ledger, &completion, events);
            events.emit(Event::RunComplete {
                summary: result.summary.clone(),
            });
            RunOutcome::Organize(result)
        })
    }

    /// Starts undoing the last organize run on the worker thread.
    pub fn start_undo(&self) -> Start {
        if !self.try_claim() {
            self.events
                .skip("Wait for current task to finish before undoing.");
            return Start::Rejected;
        }
        if self.lock_ledger().is_empty() {
            self.release();
            self.events.skip("No operations to undo.");
            return Start::Rejected;
        }

        let ledger = Arc::clone(&self.ledger);
        self.spawn(move |events| {
            let mut ledger = ledger.lock().unwrap_or_else(PoisonError::into_inner);
            let report = undo::undo(&mut ledger, events);
            events.emit(Event::RunComplete {
                summary: UNDO_SUMMARY.to_string(),
            });
            RunOutcome::Undo(report)
        })
    }

    /// Runs `task` on a named worker thread. The busy flag must already be
    /// claimed; it is released when the task returns.
    fn spawn<F>(&self, task: F) -> Start
    where
        F: FnOnce(&Sender<Event>) -> RunOutcome + Send + 'static,
    {
        let guard = BusyGuard {
            busy: Arc::clone(&self.busy),
            events: self.events.clone(),
        };

        let spawned = thread::Builder::new()
            .name("foldersort-worker".to_string())
            .spawn(move || {
                let events = guard.events.clone();
                let outcome = task(&events);
                drop(guard);
                outcome
            });

        match spawned {
            Ok(handle) => Start::Started(handle),
            Err(e) => {
                // The closure, and with it the guard, was dropped already.
                self.events
                    .error(format!("Failed to start worker thread: {}", e));
                Start::Rejected
            }
        }
    }
}
