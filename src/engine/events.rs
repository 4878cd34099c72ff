//! Session lifecycle events published on the notification bus.

use std::fmt::Display;
use std::str::FromStr;

use crate::engine::errors::EngineError;

/// Events a drawing session publishes. Each maps to one bus channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// A snapshot was captured and recorded
    SaveComplete,
    /// History moved back one entry
    Undo,
    /// History moved forward one entry
    Redo,
    /// The canvas was wiped
    Clear,
    /// The drawing mode changed
    ModeChanged,
}

impl SessionEvent {
    pub const ALL: [SessionEvent; 5] = [
        SessionEvent::SaveComplete,
        SessionEvent::Undo,
        SessionEvent::Redo,
        SessionEvent::Clear,
        SessionEvent::ModeChanged,
    ];

    /// Channel name used on the bus.
    pub fn channel(&self) -> &'static str {
        match self {
            SessionEvent::SaveComplete => "save",
            SessionEvent::Undo => "undo",
            SessionEvent::Redo => "redo",
            SessionEvent::Clear => "clear",
            SessionEvent::ModeChanged => "mode",
        }
    }
}

impl Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.channel())
    }
}

impl FromStr for SessionEvent {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionEvent::ALL
            .iter()
            .copied()
            .find(|e| e.channel() == s)
            .ok_or_else(|| EngineError::UnknownChannel(s.to_string()))
    }
}
