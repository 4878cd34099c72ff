//! Backend capability provider.
//!
//! Which drawing backend a host can run is decided once, by looking a
//! [`BackendKind`] up in a map of [`SessionFactory`]s and checking the
//! factory's required [`Capabilities`] against the host. Callers never branch
//! on the kind themselves; they get a factory and let it build the session
//! and its collaborators.
//!
//! ```
//! use grimpan::host::StaticHost;
//! use grimpan::provider::{BackendKind, BackendProvider};
//!
//! let provider = BackendProvider::new();
//! assert_eq!(provider.detect(&StaticHost::legacy()).unwrap(), BackendKind::Legacy);
//! assert!(provider.resolve_named("modern", &StaticHost::legacy()).is_err());
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::bus::BusHandle;
use crate::engine::config::{EngineConfig, HistoryConfig};
use crate::engine::errors::EngineError;
use crate::engine::history::HistoryStore;
use crate::engine::host::{CanvasElement, Capabilities, HostEnvironment};
use crate::engine::session::{Menu, Session, StatusMenu};
use crate::render::backend::RenderBackend;
use crate::render::backends::legacy::LegacyBackend;
use crate::render::backends::modern::ModernBackend;
use crate::render::Canvas;

/// Identifies a family of drawing backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Full 2D canvas (evergreen browsers)
    #[serde(alias = "chrome")]
    Modern,
    /// Bare 2D context (old browsers)
    #[serde(alias = "ie")]
    Legacy,
}

impl BackendKind {
    /// Kinds in order of preference when detecting.
    pub const PREFERENCE: [BackendKind; 2] = [BackendKind::Modern, BackendKind::Legacy];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Modern => "modern",
            BackendKind::Legacy => "legacy",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" | "chrome" => Ok(BackendKind::Modern),
            "legacy" | "ie" => Ok(BackendKind::Legacy),
            other => Err(EngineError::ConfigurationError(format!(
                "unknown backend kind '{}'",
                other
            ))),
        }
    }
}

/// Builds a session and its collaborators for one backend kind.
pub trait SessionFactory: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Host capabilities this backend cannot run without.
    fn required_capabilities(&self) -> Capabilities;

    fn create_backend(&self) -> anyhow::Result<Box<dyn RenderBackend + Send>>;

    fn create_menu(&self) -> Box<dyn Menu>;

    fn create_history(&self, config: &HistoryConfig) -> HistoryStore {
        match config.max_entries {
            Some(max) => HistoryStore::with_limit(max),
            None => HistoryStore::new(),
        }
    }

    /// Assembles a session drawing on `element`.
    fn create_session(
        &self,
        element: CanvasElement,
        bus: BusHandle,
        config: &EngineConfig,
    ) -> Result<Session, EngineError> {
        let backend = self
            .create_backend()
            .map_err(|e| EngineError::InitializationError(e.to_string()))?;
        let canvas = Canvas::new(element, backend)
            .map_err(|e| EngineError::InitializationError(e.to_string()))?;

        Session::new(
            self.kind(),
            canvas,
            self.create_history(&config.history),
            self.create_menu(),
            bus,
            config.thumbnail_size,
        )
    }
}

pub struct ModernFactory;

impl SessionFactory for ModernFactory {
    fn kind(&self) -> BackendKind {
        BackendKind::Modern
    }

    fn required_capabilities(&self) -> Capabilities {
        Capabilities::CANVAS_ELEMENT | Capabilities::CONTEXT_2D | Capabilities::PATH_2D
    }

    fn create_backend(&self) -> anyhow::Result<Box<dyn RenderBackend + Send>> {
        Ok(Box::new(ModernBackend::new()?))
    }

    fn create_menu(&self) -> Box<dyn Menu> {
        Box::new(StatusMenu::new("menu:modern"))
    }
}

pub struct LegacyFactory;

impl SessionFactory for LegacyFactory {
    fn kind(&self) -> BackendKind {
        BackendKind::Legacy
    }

    fn required_capabilities(&self) -> Capabilities {
        Capabilities::CANVAS_ELEMENT | Capabilities::CONTEXT_2D
    }

    fn create_backend(&self) -> anyhow::Result<Box<dyn RenderBackend + Send>> {
        Ok(Box::new(LegacyBackend::new()?))
    }

    fn create_menu(&self) -> Box<dyn Menu> {
        Box::new(StatusMenu::new("menu:legacy"))
    }
}

/// Capability-resolution map from backend kind to factory.
pub struct BackendProvider {
    factories: HashMap<BackendKind, Arc<dyn SessionFactory>>,
}

impl Default for BackendProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendProvider {
    /// Provider with the built-in modern and legacy factories.
    pub fn new() -> Self {
        let mut provider = Self::empty();
        provider.register(Arc::new(ModernFactory));
        provider.register(Arc::new(LegacyFactory));
        provider
    }

    /// Provider without any factories.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Adds `factory`, replacing any factory registered for the same kind.
    pub fn register(&mut self, factory: Arc<dyn SessionFactory>) {
        self.factories.insert(factory.kind(), factory);
    }

    pub fn kinds(&self) -> Vec<BackendKind> {
        BackendKind::PREFERENCE
            .iter()
            .copied()
            .filter(|k| self.factories.contains_key(k))
            .collect()
    }

    /// Returns the factory for `kind` if `host` can run it.
    ///
    /// Fails with [`EngineError::ConfigurationError`] when no factory is registered
    /// for `kind`, and with [`EngineError::EnvironmentError`] when the host lacks a
    /// capability the backend requires.
    pub fn resolve(
        &self,
        kind: BackendKind,
        host: &dyn HostEnvironment,
    ) -> Result<Arc<dyn SessionFactory>, EngineError> {
        let factory = self.factories.get(&kind).ok_or_else(|| {
            EngineError::ConfigurationError(format!("no factory registered for backend '{}'", kind))
        })?;

        let missing = factory.required_capabilities() - host.capabilities();
        if !missing.is_empty() {
            log::warn!(
                "provider: host '{}' cannot run {} backend, missing {}",
                host.user_agent(),
                kind,
                missing
            );
            return Err(EngineError::EnvironmentError(format!(
                "{} backend requires {}",
                kind, missing
            )));
        }

        Ok(factory.clone())
    }

    /// [`resolve`](Self::resolve) for a kind given by name (`modern`, `chrome`, `legacy`, `ie`).
    pub fn resolve_named(
        &self,
        kind: &str,
        host: &dyn HostEnvironment,
    ) -> Result<Arc<dyn SessionFactory>, EngineError> {
        self.resolve(kind.parse()?, host)
    }

    /// Best backend kind `host` can run, modern first.
    pub fn detect(&self, host: &dyn HostEnvironment) -> Result<BackendKind, EngineError> {
        let caps = host.capabilities();
        self.kinds()
            .into_iter()
            .find(|kind| {
                self.factories
                    .get(kind)
                    .map(|f| caps.contains(f.required_capabilities()))
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                EngineError::EnvironmentError(format!(
                    "no usable backend for host capabilities: {}",
                    caps
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bus::InMemoryBus;
    use crate::engine::host::StaticHost;

    #[test]
    fn kind_parsing_accepts_aliases() {
        assert_eq!("chrome".parse::<BackendKind>().unwrap(), BackendKind::Modern);
        assert_eq!("IE".parse::<BackendKind>().unwrap(), BackendKind::Legacy);
        assert_eq!(" legacy ".parse::<BackendKind>().unwrap(), BackendKind::Legacy);

        let err = "safari".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, EngineError::ConfigurationError(_)));
    }

    #[test]
    fn resolve_checks_capabilities() {
        let provider = BackendProvider::new();

        let factory = provider.resolve(BackendKind::Legacy, &StaticHost::legacy()).unwrap();
        assert_eq!(factory.kind(), BackendKind::Legacy);

        let err = provider.resolve(BackendKind::Modern, &StaticHost::legacy()).err().unwrap();
        assert!(matches!(err, EngineError::EnvironmentError(ref m) if m.contains("path2d")));
    }

    #[test]
    fn resolve_without_2d_context_is_environment_error() {
        let provider = BackendProvider::new();
        let host = StaticHost::legacy().with_capabilities(Capabilities::CANVAS_ELEMENT);

        let err = provider.resolve_named("ie", &host).err().unwrap();
        assert!(matches!(err, EngineError::EnvironmentError(_)));
    }

    #[test]
    fn unknown_or_unregistered_kind_is_configuration_error() {
        let provider = BackendProvider::new();
        let err = provider.resolve_named("opera", &StaticHost::modern()).err().unwrap();
        assert!(matches!(err, EngineError::ConfigurationError(_)));

        let empty = BackendProvider::empty();
        let err = empty.resolve(BackendKind::Modern, &StaticHost::modern()).err().unwrap();
        assert!(matches!(err, EngineError::ConfigurationError(_)));
    }

    #[test]
    fn detect_prefers_modern() {
        let provider = BackendProvider::new();
        assert_eq!(provider.detect(&StaticHost::modern()).unwrap(), BackendKind::Modern);
        assert_eq!(provider.detect(&StaticHost::legacy()).unwrap(), BackendKind::Legacy);

        let bare = StaticHost::modern().with_capabilities(Capabilities::empty());
        assert!(matches!(provider.detect(&bare), Err(EngineError::EnvironmentError(_))));
    }

    #[test]
    fn factory_builds_session_with_history_limit() {
        let factory = LegacyFactory;
        let mut config = EngineConfig::default();
        config.history.max_entries = Some(3);

        let session = factory
            .create_session(CanvasElement::new("c", 10, 10), Arc::new(InMemoryBus::new()), &config)
            .unwrap();

        assert_eq!(session.kind(), BackendKind::Legacy);
        assert_eq!(session.history().max_entries(), Some(3));
        assert_eq!(session.canvas().backend_name(), "LegacyBackend");
        assert_eq!(session.menu().name(), "menu:legacy");
    }

    #[test]
    fn zero_sized_canvas_fails_initialization() {
        let err = ModernFactory
            .create_session(
                CanvasElement::new("c", 0, 0),
                Arc::new(InMemoryBus::new()),
                &EngineConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InitializationError(_)));
    }
}
