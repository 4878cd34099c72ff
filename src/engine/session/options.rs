use serde::{Deserialize, Serialize};

use crate::engine::errors::EngineError;
use crate::engine::session::DrawingMode;

/// Menu setup handed to [`Menu::initialize`](super::Menu::initialize).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Tools shown in the menu, in display order
    pub tools: Vec<DrawingMode>,
    /// Show the save/undo status indicator
    pub show_status: bool,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            tools: DrawingMode::ALL.to_vec(),
            show_status: true,
        }
    }
}

/// Options for [`Session::initialize`](super::Session::initialize).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub menu: MenuConfig,
}

impl SessionOptions {
    /// Parses options from JSON, e.g. `{ "menu": { "tools": ["pen", "eraser"] } }`.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::ConfigurationError(e.to_string()))
    }
}
