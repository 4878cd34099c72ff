use std::fmt::Display;

/// Direction of a history move that ran past the available range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl Display for HistoryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryDirection::Undo => write!(f, "undo"),
            HistoryDirection::Redo => write!(f, "redo"),
        }
    }
}

/// Errors surfaced by the drawing engine.
///
/// Construction-time variants (`EnvironmentError`, `ConfigurationError`, `InitializationError`)
/// mean no usable session exists. All others are per-call and leave the
/// session operational.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Host environment is missing a required capability: {0}")]
    EnvironmentError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Session cannot be initialized: {0}")]
    InitializationError(String),

    #[error("Invalid drawing mode: {0}")]
    InvalidMode(String),

    #[error("Nothing to {0}")]
    HistoryBoundary(HistoryDirection),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Subscriber '{name}' is already registered on channel '{channel}'")]
    DuplicateSubscriber { channel: String, name: String },

    #[error("Renderer error: {0}")]
    RendererError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Internal lock is poisoned")]
    Poisoned,
}

impl EngineError {
    /// Returns true for errors that prevent a session from existing at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::EnvironmentError(_)
                | EngineError::ConfigurationError(_)
                | EngineError::InitializationError(_)
        )
    }
}
