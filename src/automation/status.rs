//! Status channel between the control thread and whoever displays status.
//!
//! Uses std::sync::mpsc so reporters can be cloned onto any thread while a
//! single consumer drains the messages on its own thread. Every report is
//! also emitted as a tracing event.

use chrono::{DateTime, Local};
use std::sync::mpsc::{Receiver, Sender, channel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// One status line.
#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
    /// When the report was made
    pub at: DateTime<Local>,
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S%.3f"), self.text)
    }
}

/// Sending half of the status channel.
#[derive(Clone, Debug)]
pub struct StatusReporter {
    sender: Sender<StatusMessage>,
}

impl StatusReporter {
    pub fn info(&self, text: impl Into<String>) {
        self.report(StatusLevel::Info, text.into());
    }

    pub fn warn(&self, text: impl Into<String>) {
        self.report(StatusLevel::Warning, text.into());
    }

    pub fn error(&self, text: impl Into<String>) {
        self.report(StatusLevel::Error, text.into());
    }

    fn report(&self, level: StatusLevel, text: String) {
        match level {
            StatusLevel::Info => tracing::info!("{}", text),
            StatusLevel::Warning => tracing::warn!("{}", text),
            StatusLevel::Error => tracing::error!("{}", text),
        }

        // A dropped consumer only loses the display; automation goes on.
        let _ = self.sender.send(StatusMessage {
            level,
            text,
            at: Local::now(),
        });
    }
}

/// Creates a new status channel.
pub fn status_channel() -> (StatusReporter, Receiver<StatusMessage>) {
    let (sender, receiver) = channel();
    (StatusReporter { sender }, receiver)
}

/// Takes every message currently queued without blocking.
pub fn drain(receiver: &Receiver<StatusMessage>) -> Vec<StatusMessage> {
    receiver.try_iter().collect()
}
