use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands accepted by the timer service.
///
/// The lowercase names double as notification action payloads and CLI
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    Stop,
}

impl TimerCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerCommand::Start => "start",
            TimerCommand::Pause => "pause",
            TimerCommand::Reset => "reset",
            TimerCommand::Stop => "stop",
        }
    }
}

impl fmt::Display for TimerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown timer command '{0}' (expected start, pause, reset or stop)")]
pub struct ParseCommandError(pub String);

impl FromStr for TimerCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "resume" => Ok(TimerCommand::Start),
            "pause" => Ok(TimerCommand::Pause),
            "reset" => Ok(TimerCommand::Reset),
            "stop" => Ok(TimerCommand::Stop),
            other => Err(ParseCommandError(other.to_string())),
        }
    }
}
