//! Command-line interface module for foldersort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - One-shot organize runs and rule management
//! - The interactive shell, which keeps the undo ledger alive between
//!   commands and stays responsive while a run is in progress

use crate::config::{SettingsStore, default_settings_path};
use crate::events::{Event, EventSink};
use crate::file_category::ExtensionTable;
use crate::output::{Console, OutputFormatter, OutputMode};
use crate::session::SessionOptions;
use crate::user_folders::default_folder;
use crate::worker::{Organizer, RunOutcome, Start};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Sort files into category folders by extension, with dry-run preview and undo"
)]
pub struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Print events as JSON lines instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Organize a single folder (defaults to ~/Downloads)
    Organize {
        /// Folder to organize
        #[arg(value_hint = clap::ValueHint::DirPath)]
        path: Option<PathBuf>,

        #[command(flatten)]
        flags: RunFlags,
    },
    /// Organize Desktop, Downloads, Documents, Pictures, Music and Videos
    All {
        #[command(flatten)]
        flags: RunFlags,
    },
    /// Manage custom extension rules
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },
    /// Interactive session with undo support (the default)
    Shell {
        /// Folder selected at start
        #[arg(value_hint = clap::ValueHint::DirPath)]
        path: Option<PathBuf>,
    },
}

/// Per-run switches, combined with the saved settings.
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct RunFlags {
    /// Only show what would be moved
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Remove empty folders afterwards
    #[arg(short = 'd', long)]
    pub delete_empty: bool,
}

impl RunFlags {
    /// Saved options with any flag given on the command line switched on.
    fn apply(self, saved: SessionOptions) -> SessionOptions {
        SessionOptions {
            dry_run: saved.dry_run || self.dry_run,
            delete_empty_dirs: saved.delete_empty_dirs || self.delete_empty,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum RuleAction {
    /// Add or update a rule, e.g. `rule add .mp4 My_Movies`
    Add { extension: String, folder: String },
    /// Show the saved rules
    List,
}

/// Runs the CLI application with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use foldersort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["foldersort", "organize", "/path/to/folder", "--dry-run"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let store = SettingsStore::load(cli.settings.unwrap_or_else(default_settings_path));
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Pretty
    };

    let (tx, rx) = mpsc::channel();
    let console = Console::spawn(mode, rx);

    let command = cli.command.unwrap_or(Command::Shell { path: None });
    let result = dispatch(command, store, &tx);

    // Dropping the last sender lets the console drain and exit.
    drop(tx);
    let _ = console.join();
    result
}

fn dispatch(command: Command, mut store: SettingsStore, events: &Sender<Event>) -> Result<(), String> {
    match command {
        Command::Organize { path, flags } => {
            let folder = path.unwrap_or_else(default_folder);
            let organizer = one_shot_organizer(&store, flags, events);
            finish_one_shot(organizer.organize_folder(&folder))
        }
        Command::All { flags } => {
            let home = dirs::home_dir().ok_or("Could not determine the home directory.")?;
            let organizer = one_shot_organizer(&store, flags, events);
            finish_one_shot(organizer.organize_user_folders(&home))
        }
        Command::Rule { action } => match action {
            RuleAction::Add { extension, folder } => {
                if save_rule(&mut store, &extension, &folder, events) {
                    Ok(())
                } else {
                    Err("Rule was not saved.".to_string())
                }
            }
            RuleAction::List => {
                for line in format_rules(store.rules()) {
                    OutputFormatter::plain(&line);
                }
                Ok(())
            }
        },
        Command::Shell { path } => {
            let folder = path.unwrap_or_else(default_folder);
            let mut shell = Shell::new(store, events.clone(), folder);
            shell.run(io::stdin().lock());
            Ok(())
        }
    }
}

fn one_shot_organizer(store: &SettingsStore, flags: RunFlags, events: &Sender<Event>) -> Organizer {
    Organizer::new(
        store.rules().clone(),
        flags.apply(store.settings().session_options()),
        events.clone(),
    )
}

fn finish_one_shot(start: Start) -> Result<(), String> {
    match start.wait() {
        Some(RunOutcome::Aborted) => Err("The organize run stopped unexpectedly.".to_string()),
        Some(_) => Ok(()),
        None => Err("Nothing was organized.".to_string()),
    }
}

/// Validates, stores and persists a rule, reporting through `events`.
///
/// Returns true when the rule was accepted. A failure to write the settings
/// file is logged but the rule stays active in memory.
fn save_rule(
    store: &mut SettingsStore,
    extension: &str,
    folder: &str,
    events: &Sender<Event>,
) -> bool {
    match store.add_rule(extension, folder) {
        Ok((extension, folder)) => {
            persist(store, events);
            events.success(format!("Rule saved: {} -> {}", extension, folder));
            true
        }
        Err(e) => {
            events.error(e.to_string());
            false
        }
    }
}

fn persist(store: &SettingsStore, events: &Sender<Event>) {
    if let Err(e) = store.save() {
        events.error(format!("Failed to save settings: {}", e));
    }
}

/// Lines describing the custom rules, sorted by extension.
pub fn format_rules(rules: &ExtensionTable) -> Vec<String> {
    let mut lines = vec!["Current Custom Rules:".to_string()];
    if rules.is_empty() {
        lines.push("  (none)".to_string());
    } else {
        lines.extend(
            rules
                .iter()
                .map(|(extension, folder)| format!("  {} -> {}", extension, folder)),
        );
    }
    lines
}

/// One line typed into the interactive shell.
#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    disable_version_flag = true,
    disable_help_flag = true,
    subcommand_required = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Choose the folder to organize
    Select {
        #[arg(required = true, num_args = 1..)]
        path: Vec<String>,
    },
    /// Organize the selected folder
    Organize,
    /// Organize all six standard user folders
    All,
    /// Undo the last organize run
    Undo,
    /// Preview runs without moving anything
    DryRun { state: Toggle },
    /// Remove empty folders after organizing
    DeleteEmpty { state: Toggle },
    /// Add or update a rule: rule .mp4 My_Movies
    Rule {
        extension: String,
        #[arg(required = true, num_args = 1..)]
        folder: Vec<String>,
    },
    /// List custom rules
    Rules,
    /// Show the current folder, switches and undo state
    Status,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        self == Toggle::On
    }
}

/// Whether the shell keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlow {
    Continue,
    Quit,
}

/// Interactive front end: holds the selected folder and the settings store,
/// and forwards organize and undo requests to the background worker.
pub struct Shell {
    store: SettingsStore,
    organizer: Organizer,
    events: Sender<Event>,
    folder: PathBuf,
    active: Option<JoinHandle<RunOutcome>>,
}

impl Shell {
    pub fn new(store: SettingsStore, events: Sender<Event>, folder: PathBuf) -> Self {
        let organizer = Organizer::new(
            store.rules().clone(),
            store.settings().session_options(),
            events.clone(),
        );
        Self {
            store,
            organizer,
            events,
            folder,
            active: None,
        }
    }

    /// Reads commands until `quit` or end of input, then waits for any
    /// run still in progress.
    pub fn run(&mut self, input: impl BufRead) {
        OutputFormatter::header("foldersort: type `help` for commands");
        OutputFormatter::info(&format!("Selected folder: {}", self.folder.display()));
        Self::prompt();

        for line in input.lines() {
            let Ok(line) = line else { break };
            if self.execute(&line) == ShellFlow::Quit {
                break;
            }
            Self::prompt();
        }

        if self.organizer.is_running() {
            OutputFormatter::info("Waiting for the current run to finish...");
        }
        self.wait();
    }

    fn prompt() {
        print!("> ");
        let _ = io::stdout().flush();
    }

    /// Parses and executes one command line.
    pub fn execute(&mut self, line: &str) -> ShellFlow {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return ShellFlow::Continue;
        }

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // Also covers `help`, which clap reports as an "error".
                OutputFormatter::plain(&e.render().to_string());
                return ShellFlow::Continue;
            }
        };

        match command {
            ShellCommand::Select { path } => self.select(PathBuf::from(path.join(" "))),
            ShellCommand::Organize => {
                let start = self.organizer.organize_folder(&self.folder);
                self.track(start);
            }
            ShellCommand::All => match dirs::home_dir() {
                Some(home) => {
                    let start = self.organizer.organize_user_folders(&home);
                    self.track(start);
                }
                None => self.events.error("Could not determine the home directory."),
            },
            ShellCommand::Undo => {
                let start = self.organizer.start_undo();
                self.track(start);
            }
            ShellCommand::DryRun { state } => {
                self.store.set_dry_run(state.enabled());
                self.apply_options();
                self.events.info(format!(
                    "Dry run mode {}.",
                    if state.enabled() { "enabled" } else { "disabled" }
                ));
            }
            ShellCommand::DeleteEmpty { state } => {
                self.store.set_delete_empty(state.enabled());
                self.apply_options();
                self.events.info(format!(
                    "Delete empty folders {}.",
                    if state.enabled() { "enabled" } else { "disabled" }
                ));
            }
            ShellCommand::Rule { extension, folder } => {
                if save_rule(&mut self.store, &extension, &folder.join(" "), &self.events) {
                    self.organizer.set_rules(self.store.rules().clone());
                }
            }
            ShellCommand::Rules => {
                for line in format_rules(self.store.rules()) {
                    OutputFormatter::plain(&line);
                }
            }
            ShellCommand::Status => self.print_status(),
            ShellCommand::Quit => return ShellFlow::Quit,
        }
        ShellFlow::Continue
    }

    /// Blocks until the most recently started run has finished.
    pub fn wait(&mut self) -> Option<RunOutcome> {
        self.active
            .take()
            .map(|handle| handle.join().unwrap_or(RunOutcome::Aborted))
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    fn select(&mut self, folder: PathBuf) {
        self.events
            .success(format!("Selected folder: {}", folder.display()));
        self.folder = folder;
    }

    fn track(&mut self, start: Start) {
        if let Start::Started(handle) = start {
            // The guard only lets a run start once the previous one is over.
            if let Some(previous) = self.active.replace(handle) {
                let _ = previous.join();
            }
        }
    }

    fn apply_options(&mut self) {
        persist(&self.store, &self.events);
        self.organizer
            .set_options(self.store.settings().session_options());
    }

    fn print_status(&self) {
        let options = self.organizer.options();
        let on_off = |flag: bool| if flag { "on" } else { "off" };

        OutputFormatter::header("Status");
        OutputFormatter::plain(&format!("Folder:        {}", self.folder.display()));
        OutputFormatter::plain(&format!("Dry run:       {}", on_off(options.dry_run)));
        OutputFormatter::plain(&format!(
            "Delete empty:  {}",
            on_off(options.delete_empty_dirs)
        ));
        OutputFormatter::plain(&format!("Custom rules:  {}", self.organizer.rules().len()));
        OutputFormatter::plain(&format!("Settings file: {}", self.store.path().display()));

        let undo = match self.organizer.undo_status() {
            None => "busy".to_string(),
            Some((0, _)) => "nothing to undo".to_string(),
            Some((count, Some(at))) => format!("{} moves from {}", count, at.format("%H:%M:%S")),
            Some((count, None)) => format!("{} moves", count),
        };
        let running = if self.organizer.is_running() {
            "running"
        } else {
            "idle"
        };
        OutputFormatter::plain(&format!("Worker:        {}", running));
        OutputFormatter::plain(&format!("Undo:          {}", undo));
    }
}
