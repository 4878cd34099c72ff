use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::errors::EngineError;

/// Tool the session is currently drawing with.
///
/// Exactly one mode is active at a time. It only changes through an explicit
/// [`Session::set_mode`](crate::session::Session::set_mode) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingMode {
    #[default]
    Pen,
    Eraser,
    Pipette,
    Circle,
    Rectangle,
}

impl DrawingMode {
    pub const ALL: [DrawingMode; 5] = [
        DrawingMode::Pen,
        DrawingMode::Eraser,
        DrawingMode::Pipette,
        DrawingMode::Circle,
        DrawingMode::Rectangle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrawingMode::Pen => "pen",
            DrawingMode::Eraser => "eraser",
            DrawingMode::Pipette => "pipette",
            DrawingMode::Circle => "circle",
            DrawingMode::Rectangle => "rectangle",
        }
    }
}

impl Display for DrawingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DrawingMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrawingMode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| EngineError::InvalidMode(s.to_string()))
    }
}
