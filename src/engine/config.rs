use serde::{Deserialize, Serialize};

use crate::engine::errors::EngineError;
use crate::engine::provider::BackendKind;

const DEFAULT_THUMBNAIL_SIZE: u32 = 64;
const DEFAULT_AUTOSAVE_CAPACITY: usize = 16;

/// History configuration for new sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// How many snapshots a session keeps. `None` keeps everything.
    pub max_entries: Option<usize>,
}

/// Autosave configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Whether sessions should be persisted on every save
    pub enabled: bool,
    /// Queue size between the bus and the autosave task
    pub capacity: usize,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: DEFAULT_AUTOSAVE_CAPACITY,
        }
    }
}

/// Main engine configuration.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use grimpan::config::EngineConfig;
///
/// let json = r#"{ "default_backend": "chrome", "history": { "max_entries": 50 } }"#;
/// let config = EngineConfig::from_json(json).unwrap();
/// assert_eq!(config.history.max_entries, Some(50));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend to use when none is requested. `None` picks the best one the host supports.
    pub default_backend: Option<BackendKind>,
    /// History settings for every session
    pub history: HistoryConfig,
    /// Longest side of menu thumbnails, in pixels
    pub thumbnail_size: u32,
    /// Autosave settings
    pub autosave: AutosaveConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_backend: None,
            history: HistoryConfig::default(),
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            autosave: AutosaveConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON. Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::ConfigurationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.thumbnail_size == 0 {
            return Err(EngineError::ConfigurationError(
                "thumbnail_size must be greater than zero".into(),
            ));
        }
        if self.history.max_entries == Some(0) {
            return Err(EngineError::ConfigurationError(
                "history.max_entries must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
