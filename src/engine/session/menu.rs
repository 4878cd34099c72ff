use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::bus::Listener;
use crate::engine::errors::EngineError;
use crate::engine::session::MenuConfig;

/// Menu collaborator of a session.
pub trait Menu: Send {
    fn name(&self) -> &str;

    /// Applies `config`. Fails with [`EngineError::ConfigurationError`] on an unusable config.
    fn initialize(&mut self, config: &MenuConfig) -> Result<(), EngineError>;

    fn is_initialized(&self) -> bool;

    /// Listener the session subscribes on its channels so the menu can reflect events.
    fn listener(&self) -> Arc<dyn Listener>;
}

/// Status indicator fed by bus events. A hidden indicator ignores events.
pub struct MenuStatus {
    name: String,
    visible: AtomicBool,
    last_event: Mutex<Option<String>>,
    counts: Mutex<HashMap<String, usize>>,
}

impl MenuStatus {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visible: AtomicBool::new(true),
            last_event: Mutex::new(None),
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn last_event(&self) -> Option<String> {
        self.last_event.lock().ok().and_then(|e| e.clone())
    }

    /// Number of times `event` was received.
    pub fn count(&self, event: &str) -> usize {
        self.counts
            .lock()
            .ok()
            .and_then(|c| c.get(event).copied())
            .unwrap_or(0)
    }
}

impl Listener for MenuStatus {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, event: &str) {
        if !self.is_visible() {
            return;
        }
        if let Ok(mut last) = self.last_event.lock() {
            *last = Some(event.to_string());
        }
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(event.to_string()).or_insert(0) += 1;
        }
    }
}

/// Default menu: a tool list plus a [`MenuStatus`] indicator.
pub struct StatusMenu {
    name: String,
    config: Option<MenuConfig>,
    status: Arc<MenuStatus>,
}

impl StatusMenu {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            config: None,
            status: Arc::new(MenuStatus::new(name)),
        }
    }

    pub fn status(&self) -> Arc<MenuStatus> {
        self.status.clone()
    }

    pub fn config(&self) -> Option<&MenuConfig> {
        self.config.as_ref()
    }
}

impl Menu for StatusMenu {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, config: &MenuConfig) -> Result<(), EngineError> {
        if config.tools.is_empty() {
            return Err(EngineError::ConfigurationError("menu needs at least one tool".into()));
        }
        for (i, tool) in config.tools.iter().enumerate() {
            if config.tools[..i].contains(tool) {
                return Err(EngineError::ConfigurationError(format!(
                    "tool '{}' listed twice in menu",
                    tool
                )));
            }
        }

        log::debug!("menu[{}]: initialized with {} tools", self.name, config.tools.len());
        self.status.set_visible(config.show_status);
        self.config = Some(config.clone());
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    fn listener(&self) -> Arc<dyn Listener> {
        self.status.clone()
    }
}
