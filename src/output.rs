//! Output formatting and styling module.
//!
//! Renders engine events on the terminal: colored log lines, a progress bar
//! while files are being moved, and phase indicators. Front ends that want
//! machine-readable output can print events as JSON lines instead.

use crate::events::{Event, Level, Phase};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

/// Resolution of the progress bar; fractions are scaled to this length.
const PROGRESS_STEPS: u64 = 1000;

/// How events are written to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Colored, human-oriented lines with a progress bar.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Formats a log line with a timestamp and a colored level prefix.
    ///
    /// ```
    /// use foldersort::events::Level;
    /// use foldersort::output::OutputFormatter;
    ///
    /// colored::control::set_override(false);
    /// let line = OutputFormatter::log_line(Level::Skip, "Skipped a.txt", "12:00:00");
    /// assert_eq!(line, "12:00:00 [SKIP] Skipped a.txt");
    /// ```
    pub fn log_line(level: Level, message: &str, timestamp: &str) -> String {
        let prefix = match level {
            Level::Info => level.prefix().cyan(),
            Level::Success => level.prefix().green(),
            Level::Error => level.prefix().red().bold(),
            Level::Skip => level.prefix().yellow(),
        };
        format!("{} {} {}", timestamp.dimmed(), prefix, message)
    }

    /// Formats the phase indicator, highlighting the active phase.
    pub fn phase_line(active: Phase) -> String {
        [Phase::Scanning, Phase::Moving, Phase::Done]
            .iter()
            .map(|phase| {
                let label = format!(" {} ", phase);
                if *phase != active {
                    return label.dimmed().to_string();
                }
                match phase {
                    Phase::Scanning => label.black().on_blue().to_string(),
                    Phase::Moving => label.black().on_yellow().to_string(),
                    _ => label.black().on_green().to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Creates a progress bar for the moving phase.
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(PROGRESS_STEPS);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }
}

/// Draws events on the terminal as they arrive.
pub struct Console {
    mode: OutputMode,
    bar: Option<ProgressBar>,
}

impl Console {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode, bar: None }
    }

    /// Renders events on a background thread until every sender is dropped.
    pub fn spawn(mode: OutputMode, events: Receiver<Event>) -> JoinHandle<()> {
        thread::spawn(move || {
            let mut console = Console::new(mode);
            for event in events {
                console.render(&event);
            }
            console.finish();
        })
    }

    /// Renders a single event.
    pub fn render(&mut self, event: &Event) {
        if self.mode == OutputMode::Json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => OutputFormatter::error(&format!("Failed to encode event: {}", e)),
            }
            return;
        }

        match event {
            Event::PhaseChanged { phase } => self.on_phase(*phase),
            Event::Progress { fraction } => {
                if let Some(bar) = &self.bar {
                    bar.set_position((fraction * PROGRESS_STEPS as f64).round() as u64);
                }
            }
            Event::Log { level, message } => {
                let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
                self.print(&OutputFormatter::log_line(*level, message, &timestamp));
            }
            Event::RunComplete { summary } => {
                self.finish();
                OutputFormatter::success(summary);
            }
        }
    }

    fn on_phase(&mut self, phase: Phase) {
        match phase {
            Phase::Moving => {
                self.finish();
                let bar = OutputFormatter::create_progress_bar();
                bar.set_message("Moving files...");
                self.bar = Some(bar);
            }
            Phase::Idle => {
                self.finish();
                return;
            }
            Phase::Done => self.finish(),
            Phase::Scanning => {}
        }
        self.print(&OutputFormatter::phase_line(phase));
    }

    /// Prints above the progress bar when one is active.
    fn print(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
