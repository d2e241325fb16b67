//! Notification channel between the engine and whatever front end drives it.
//!
//! The engine never talks to a terminal directly. Everything it wants to say
//! (phase changes, progress, log lines, the final summary) goes through an
//! [`EventSink`], which in practice is the sending half of an `mpsc` channel.

use serde::Serialize;
use std::fmt;
use std::sync::mpsc::Sender;

/// Phase of the engine, shown by the front end as a status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Scanning,
    Moving,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "Idle",
            Phase::Scanning => "Scanning",
            Phase::Moving => "Moving",
            Phase::Done => "Done",
        };
        f.write_str(name)
    }
}

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Success,
    Error,
    Skip,
}

impl Level {
    /// Bracketed prefix used when the line is rendered as text.
    pub fn prefix(&self) -> &'static str {
        match self {
            Level::Info => "[INFO]",
            Level::Success => "[SUCCESS]",
            Level::Error => "[ERROR]",
            Level::Skip => "[SKIP]",
        }
    }
}

/// A single notification emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    PhaseChanged { phase: Phase },
    Progress { fraction: f64 },
    Log { level: Level, message: String },
    RunComplete { summary: String },
}

/// Destination for engine events.
///
/// Emitting never fails from the engine's point of view: a front end that
/// went away simply stops receiving.
pub trait EventSink {
    fn emit(&self, event: Event);

    fn log(&self, level: Level, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(Event::Log {
            level,
            message: message.into(),
        });
    }

    fn info(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(Level::Info, message);
    }

    fn success(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(Level::Success, message);
    }

    fn error(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(Level::Error, message);
    }

    fn skip(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(Level::Skip, message);
    }

    fn phase(&self, phase: Phase)
    where
        Self: Sized,
    {
        self.emit(Event::PhaseChanged { phase });
    }

    /// Reports progress, clamped to `[0, 1]`.
    fn progress(&self, fraction: f64)
    where
        Self: Sized,
    {
        self.emit(Event::Progress {
            fraction: fraction.clamp(0.0, 1.0),
        });
    }
}

impl EventSink for Sender<Event> {
    fn emit(&self, event: Event) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.send(event);
    }
}
