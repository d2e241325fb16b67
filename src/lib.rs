//! foldersort - sort a folder's files into category subfolders by extension
//!
//! This library provides extension classification with user overrides,
//! folder scanning, a conflict-safe mover, the organize session engine,
//! a single-level undo ledger and a background worker that reports progress
//! through a channel of events.

pub mod cli;
pub mod config;
pub mod events;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod scanner;
pub mod session;
pub mod undo;
pub mod user_folders;
pub mod worker;

pub use config::{Settings, SettingsError, SettingsStore};
pub use events::{Event, EventSink, Level, Phase};
pub use file_category::{Classification, ExtensionTable, RuleError, classify, extension_of};
pub use file_organizer::{FileOrganizer, MoveError, MoveRecord};
pub use scanner::{FileEntry, ScanError, scan};
pub use session::{Job, SessionOptions, SessionResult, SessionStatus};
pub use undo::{UndoLedger, UndoReport};
pub use worker::{Organizer, RunOutcome, Start};

pub use cli::{Cli, run_cli};
