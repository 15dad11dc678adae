//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use super::ipc::{OutboundMessage, ReplyStatus};
use crate::domain::voice::{EventValue, MsgType};

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print the server status line
    pub fn server_status(&self, state: &str) {
        eprintln!("{} Bridge: {}", "●".cyan(), state);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Raw JSON line on stdout, human summary on stderr
    pub fn message(&self, message: &OutboundMessage) {
        if let Ok(line) = serde_json::to_string(message) {
            self.output(&line);
        }
        eprintln!("{}", self.describe(message));
    }

    pub fn describe(&self, message: &OutboundMessage) -> String {
        match message {
            OutboundMessage::Reply { status, value, .. } => match status {
                ReplyStatus::Ok if value.is_null() => format!("{} ok", "←".green()),
                ReplyStatus::Ok => format!("{} ok {}", "←".green(), value),
                ReplyStatus::Error => format!("{} error {}", "←".red(), value),
            },
            OutboundMessage::Event {
                id,
                msg_type,
                value,
            } => format!(
                "{} {} {} {}",
                "↓".cyan(),
                id,
                msg_type_name(*msg_type),
                describe_value(*msg_type, value)
            ),
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn msg_type_name(msg_type: MsgType) -> &'static str {
    match msg_type {
        MsgType::State => "STATE",
        MsgType::Duration => "DURATION",
        MsgType::Position => "POSITION",
        MsgType::Power => "POWER",
        MsgType::Error => "ERROR",
    }
}

fn describe_value(msg_type: MsgType, value: &EventValue) -> String {
    match (msg_type, value) {
        (MsgType::State, EventValue::Number(n)) => match *n as u8 {
            0 => "none".to_string(),
            1 => "starting".to_string(),
            2 => "running".to_string(),
            3 => "paused".to_string(),
            4 => "stopped".to_string(),
            other => other.to_string(),
        },
        (MsgType::Power, EventValue::Number(n)) => format!("{:.1} dB", n),
        (_, EventValue::Number(n)) => format!("{:.3}s", n),
        (_, EventValue::Error(e)) => format!("{} {}", e.code, e.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::VoiceError;
    use crate::domain::voice::{BridgeReply, VoiceEvent, VoiceState};

    #[test]
    fn describes_state_events_by_name() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let msg = OutboundMessage::from(VoiceEvent::state("clip1", VoiceState::Running));
        assert_eq!(presenter.describe(&msg), "↓ clip1 STATE running");
    }

    #[test]
    fn describes_errors_with_symbolic_code() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let msg = OutboundMessage::from(VoiceEvent::error("a", VoiceError::network("offline")));
        assert!(presenter.describe(&msg).contains("VOICE_ERR_NETWORK offline"));
    }

    #[test]
    fn describes_numeric_reply() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let msg = OutboundMessage::reply(None, &BridgeReply::Number(1.5));
        assert_eq!(presenter.describe(&msg), "← ok 1.5");
    }
}
