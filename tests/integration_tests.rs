use foldersort::config::SettingsStore;
use foldersort::events::{Event, Level, Phase};
use foldersort::file_category::ExtensionTable;
use foldersort::session::{SessionOptions, SessionStatus};
use foldersort::worker::{Organizer, RunOutcome, UNDO_SUMMARY};
/// Integration tests for foldersort
///
/// These tests drive the engine the way a front end does: through the
/// background [`Organizer`] and the event channel, against real temporary
/// directories.
///
/// Test categories:
/// 1. Basic organization workflows
/// 2. Custom rules and settings
/// 3. Dry-run mode verification
/// 4. Undo and conflict handling
/// 5. Bulk mode over the standard user folders
/// 6. Edge cases
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture that sets up a temporary directory plus an organizer wired
/// to a channel the test can inspect.
struct TestFixture {
    temp_dir: TempDir,
    organizer: Organizer,
    events: Receiver<Event>,
}

impl TestFixture {
    /// Create a new test fixture with default rules and options.
    fn new() -> Self {
        Self::with(ExtensionTable::new(), SessionOptions::default())
    }

    /// Create a fixture with specific rules and options.
    fn with(rules: ExtensionTable, options: SessionOptions) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (tx, rx) = mpsc::channel();
        TestFixture {
            temp_dir,
            organizer: Organizer::new(rules, options, tx),
            events: rx,
        }
    }

    /// Get the path to the test directory.
    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file with content, creating parent directories as needed.
    fn create_file(&self, rel_path: &str, content: &str) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content.as_bytes())
            .expect("Failed to write file content");
    }

    /// Create several files at once.
    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_file(name, name);
        }
    }

    /// Assert that a file exists at the given relative path.
    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    /// Assert that nothing exists at the given relative path.
    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// Read a file's content.
    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// All files below the test directory, relative and sorted.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), &mut files);
        let mut relative: Vec<PathBuf> = files
            .into_iter()
            .filter_map(|path| path.strip_prefix(self.path()).ok().map(Path::to_path_buf))
            .collect();
        relative.sort();
        relative
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    Self::walk_dir(&path, files);
                } else {
                    files.push(path);
                }
            }
        }
    }

    /// Organize the fixture directory and wait for the result.
    fn organize(&self) -> RunOutcome {
        self.organizer
            .organize_folder(self.path())
            .wait()
            .expect("Organize run should start")
    }

    /// Undo the last run and wait for the result.
    fn undo(&self) -> Option<RunOutcome> {
        self.organizer.start_undo().wait()
    }

    /// Drain all events emitted so far.
    fn drain(&self) -> Vec<Event> {
        self.events.try_iter().collect()
    }

    /// Drain events and keep only log lines.
    fn drain_logs(&self) -> Vec<(Level, String)> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                Event::Log { level, message } => Some((level, message)),
                _ => None,
            })
            .collect()
    }
}

fn session_result(outcome: RunOutcome) -> foldersort::session::SessionResult {
    match outcome {
        RunOutcome::Organize(result) => result,
        other => panic!("expected an organize outcome, got {:?}", other),
    }
}

// ============================================================================
// 1. Basic Organization Workflows
// ============================================================================

#[test]
fn test_organize_mixed_folder() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.mp4", "c.xyz"]);

    let result = session_result(fixture.organize());
    assert_eq!(result.status, SessionStatus::Completed);
    assert_eq!(result.total_files, 3);
    assert_eq!(result.moved, 3);
    assert_eq!(result.summary, "Folder organized successfully.");

    fixture.assert_file_exists("Documents/a.pdf");
    fixture.assert_file_exists("Videos/b.mp4");
    fixture.assert_file_exists("XYZ_Files/c.xyz");
    fixture.assert_not_exists("a.pdf");

    let logs = fixture.drain_logs();
    assert!(logs.contains(&(Level::Info, "Created XYZ_Files for .XYZ".to_string())));
    assert!(logs.contains(&(Level::Success, "Moved a.pdf -> Documents".to_string())));
    assert!(logs.contains(&(Level::Success, "Session complete. 3 files moved.".to_string())));
}

#[test]
fn test_content_is_preserved() {
    let fixture = TestFixture::new();
    fixture.create_file("notes.txt", "remember the milk");

    fixture.organize();
    assert_eq!(fixture.read("Documents/notes.txt"), "remember the milk");
}

#[test]
fn test_extension_case_and_missing_extension() {
    let fixture = TestFixture::new();
    fixture.create_files(&["PHOTO.JPG", "Makefile", ".bashrc"]);

    fixture.organize();
    fixture.assert_file_exists("Images/PHOTO.JPG");
    fixture.assert_file_exists("No_Extension_Files/Makefile");
    fixture.assert_file_exists("No_Extension_Files/.bashrc");
}

#[test]
fn test_subdirectories_are_not_descended() {
    let fixture = TestFixture::new();
    fixture.create_file("nested/deep.pdf", "pdf");
    fixture.create_file("top.pdf", "pdf");

    let result = session_result(fixture.organize());
    assert_eq!(result.moved, 1);
    fixture.assert_file_exists("nested/deep.pdf");
    fixture.assert_file_exists("Documents/top.pdf");
}

#[test]
fn test_builtin_categories() {
    let fixture = TestFixture::new();
    fixture.create_files(&["tool.py", "run.bat", "data.csv", "song.flac", "backup.7z"]);

    fixture.organize();
    fixture.assert_file_exists("Developer_Files/tool.py");
    fixture.assert_file_exists("System_Apps/run.bat");
    fixture.assert_file_exists("Documents/data.csv");
    fixture.assert_file_exists("Audio/song.flac");
    fixture.assert_file_exists("Archives/backup.7z");

    // Built-in categories are not announced as newly created.
    let logs = fixture.drain_logs();
    assert!(!logs.iter().any(|(_, message)| message.starts_with("Created ")));
}

#[test]
fn test_second_run_is_noop() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.mp4"]);

    fixture.organize();
    let before = fixture.list_files_recursive();
    let _ = fixture.drain();

    let result = session_result(fixture.organize());
    assert_eq!(result.status, SessionStatus::NoOp);
    assert_eq!(result.summary, "No files queued for processing.");
    assert_eq!(fixture.list_files_recursive(), before);

    // The earlier run can still be undone.
    assert!(matches!(fixture.undo(), Some(RunOutcome::Undo(_))));
    fixture.assert_file_exists("a.pdf");
}

// ============================================================================
// 2. Custom Rules and Settings
// ============================================================================

#[test]
fn test_custom_rule_overrides_builtin() {
    let mut rules = ExtensionTable::new();
    rules.insert(".MP4", "My_Movies").expect("valid rule");
    let fixture = TestFixture::with(rules, SessionOptions::default());
    fixture.create_files(&["clip.mp4", "film.mkv"]);

    fixture.organize();
    fixture.assert_file_exists("My_Movies/clip.mp4");
    fixture.assert_file_exists("Videos/film.mkv");
    fixture.assert_not_exists("Videos/clip.mp4");
}

#[test]
fn test_saved_settings_drive_a_run() {
    let fixture = TestFixture::new();
    let settings_path = fixture.path().join("config").join("settings.json");

    let mut store = SettingsStore::load(&settings_path);
    store.add_rule(".blend", "Blender").expect("valid rule");
    store.set_delete_empty(true);
    store.save().expect("save settings");

    let reloaded = SettingsStore::load(&settings_path);
    let (tx, _rx) = mpsc::channel();
    let organizer = Organizer::new(
        reloaded.rules().clone(),
        reloaded.settings().session_options(),
        tx,
    );

    let inbox = fixture.path().join("inbox");
    fs::create_dir_all(inbox.join("empty")).expect("create dirs");
    fs::write(inbox.join("scene.blend"), "blend").expect("write");

    organizer.organize_folder(&inbox).wait();
    assert!(inbox.join("Blender").join("scene.blend").is_file());
    assert!(!inbox.join("empty").exists());
}

// ============================================================================
// 3. Dry-Run Mode Verification
// ============================================================================

#[test]
fn test_dry_run_changes_nothing() {
    let fixture = TestFixture::with(
        ExtensionTable::new(),
        SessionOptions {
            dry_run: true,
            delete_empty_dirs: true,
        },
    );
    fixture.create_files(&["a.pdf", "b.mp4", "c.xyz"]);
    fs::create_dir(fixture.path().join("empty")).expect("create dir");
    let before = fixture.list_files_recursive();

    let result = session_result(fixture.organize());
    assert!(result.dry_run);
    assert_eq!(result.moved, 0);
    assert_eq!(fixture.list_files_recursive(), before);
    assert!(fixture.path().join("empty").is_dir());
    fixture.assert_not_exists("Documents");

    let logs = fixture.drain_logs();
    assert!(logs.contains(&(Level::Success, "[DRY] a.pdf -> Documents".to_string())));
    assert!(logs.contains(&(Level::Info, "Dry run complete. No files were moved.".to_string())));

    assert!(fixture.undo().is_none());
}

// ============================================================================
// 4. Undo and Conflict Handling
// ============================================================================

#[test]
fn test_undo_restores_original_layout() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.mp4", "c.xyz", "song.mp3"]);
    let before = fixture.list_files_recursive();

    fixture.organize();
    assert_ne!(fixture.list_files_recursive(), before);

    match fixture.undo() {
        Some(RunOutcome::Undo(report)) => {
            assert_eq!(report.restored_files, 4);
            assert!(report.is_complete_success());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(fixture.list_files_recursive(), before);

    let events = fixture.drain();
    assert!(events.contains(&Event::RunComplete {
        summary: UNDO_SUMMARY.to_string()
    }));

    // Ledger is consumed.
    assert!(fixture.undo().is_none());
    let logs = fixture.drain_logs();
    assert_eq!(
        logs,
        vec![(Level::Skip, "No operations to undo.".to_string())]
    );
}

#[test]
fn test_undo_skips_files_moved_away() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.pdf"]);

    fixture.organize();
    fs::remove_file(fixture.path().join("Documents/b.pdf")).expect("remove");

    match fixture.undo() {
        Some(RunOutcome::Undo(report)) => {
            assert_eq!(report.restored_files, 1);
            assert_eq!(report.skipped_files.len(), 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    fixture.assert_file_exists("a.pdf");
}

#[test]
fn test_existing_destination_is_never_overwritten() {
    let fixture = TestFixture::new();
    fixture.create_file("Documents/a.pdf", "already sorted");
    fixture.create_file("a.pdf", "new download");

    let result = session_result(fixture.organize());
    assert_eq!(result.moved, 0);
    assert_eq!(fixture.read("Documents/a.pdf"), "already sorted");
    assert_eq!(fixture.read("a.pdf"), "new download");

    let logs = fixture.drain_logs();
    assert!(logs.contains(&(
        Level::Skip,
        "Skipped a.pdf: already exists in Documents".to_string()
    )));
}

// ============================================================================
// 5. Bulk Mode
// ============================================================================

#[test]
fn test_bulk_mode_over_fake_home() {
    let fixture = TestFixture::new();
    let home = fixture.path();
    fixture.create_files(&["Desktop/Shortcut.lnk", "Desktop/todo.txt", "Downloads/setup.zip"]);
    fs::create_dir_all(home.join("Music")).expect("create dir");

    let outcome = fixture
        .organizer
        .organize_user_folders(home)
        .wait()
        .expect("Bulk run should start");
    let result = session_result(outcome);
    assert_eq!(result.moved, 2);
    assert_eq!(result.summary, "Organized all 6 user folders successfully!");

    fixture.assert_file_exists("Desktop/Shortcut.lnk");
    fixture.assert_file_exists("Desktop/Documents/todo.txt");
    fixture.assert_file_exists("Downloads/Archives/setup.zip");

    let logs = fixture.drain_logs();
    assert!(logs.iter().any(|(level, message)| {
        *level == Level::Skip && message.starts_with("Pictures not found at")
    }));
    assert!(logs.iter().any(|(level, message)| {
        *level == Level::Skip && message.starts_with("No eligible files found in")
    }));

    fixture.undo();
    fixture.assert_file_exists("Desktop/todo.txt");
    fixture.assert_file_exists("Downloads/setup.zip");
}

// ============================================================================
// 6. Edge Cases
// ============================================================================

#[test]
fn test_progress_and_phases() {
    let fixture = TestFixture::new();
    fixture.create_files(&["1.txt", "2.png", "3.wav", "4.zip", "5.iso"]);

    fixture.organize();
    let events = fixture.drain();

    let fractions: Vec<f64> = events
        .iter()
        .filter_map(|event| match event {
            Event::Progress { fraction } => Some(*fraction),
            _ => None,
        })
        .collect();
    assert_eq!(fractions.first(), Some(&0.0));
    assert_eq!(fractions.last(), Some(&1.0));
    assert!(fractions.windows(2).all(|pair| pair[0] <= pair[1]));

    let phases: Vec<Phase> = events
        .iter()
        .filter_map(|event| match event {
            Event::PhaseChanged { phase } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![Phase::Scanning, Phase::Moving, Phase::Done, Phase::Idle]
    );
    assert!(!fixture.organizer.is_running());
}

#[test]
fn test_invalid_folder_is_rejected() {
    let fixture = TestFixture::new();
    let start = fixture
        .organizer
        .organize_folder(&fixture.path().join("does-not-exist"));

    assert!(!start.is_started());
    assert_eq!(
        fixture.drain_logs(),
        vec![(Level::Error, "Selected folder is invalid.".to_string())]
    );
}

#[test]
fn test_empty_folder_reports_noop() {
    let fixture = TestFixture::new();

    let result = session_result(fixture.organize());
    assert_eq!(result.status, SessionStatus::NoOp);
    assert!(fixture.drain().contains(&Event::RunComplete {
        summary: "No files queued for processing.".to_string()
    }));
}
