//! Session registry: one drawing session per backend kind.
//!
//! The registry is created once at startup and passed around by reference.
//! It owns the provider, the shared notification bus and the cache of
//! sessions. The first request for a kind builds the session, and every
//! later request returns the same [`SessionHandle`].
//!
//! ```
//! use std::sync::Arc;
//! use grimpan::host::StaticHost;
//! use grimpan::registry::SessionRegistry;
//!
//! let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));
//! let a = registry.get_instance("chrome").unwrap();
//! let b = registry.get_instance("modern").unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::bus::{BusHandle, InMemoryBus};
use crate::engine::config::EngineConfig;
use crate::engine::errors::EngineError;
use crate::engine::host::HostEnvironment;
use crate::engine::persist::{AutosaveWorker, SnapshotStore};
use crate::engine::provider::{BackendKind, BackendProvider};
use crate::engine::session::Session;

/// Shared handle to a session. Identity is `Arc::ptr_eq`.
pub type SessionHandle = Arc<Mutex<Session>>;

struct Autosave {
    store: Arc<dyn SnapshotStore>,
    cancel: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

pub struct SessionRegistry {
    config: EngineConfig,
    host: Arc<dyn HostEnvironment>,
    provider: BackendProvider,
    bus: BusHandle,
    sessions: Mutex<HashMap<BackendKind, SessionHandle>>,
    autosave: Option<Autosave>,
}

impl SessionRegistry {
    pub fn new(
        config: EngineConfig,
        host: Arc<dyn HostEnvironment>,
        provider: BackendProvider,
        bus: BusHandle,
    ) -> Self {
        Self {
            config,
            host,
            provider,
            bus,
            sessions: Mutex::new(HashMap::new()),
            autosave: None,
        }
    }

    /// Registry with the default config, the built-in backends and an in-memory bus.
    pub fn with_defaults(host: Arc<dyn HostEnvironment>) -> Self {
        Self::new(
            EngineConfig::default(),
            host,
            BackendProvider::new(),
            Arc::new(InMemoryBus::new()),
        )
    }

    /// Persist every session created from now on into `store`, if autosave is
    /// enabled in the config. Sessions must then be requested from inside a
    /// tokio runtime.
    pub fn with_autosave(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.autosave = Some(Autosave {
            store,
            cancel: CancellationToken::new(),
            workers: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bus(&self) -> BusHandle {
        self.bus.clone()
    }

    pub fn provider(&self) -> &BackendProvider {
        &self.provider
    }

    /// Returns the session for the kind named `kind` (`modern`/`chrome`,
    /// `legacy`/`ie`), creating it on first use.
    pub fn get_instance(&self, kind: &str) -> Result<SessionHandle, EngineError> {
        self.get_instance_of(kind.parse()?)
    }

    /// Session for the configured default kind, or the best kind the host supports.
    pub fn get_default(&self) -> Result<SessionHandle, EngineError> {
        let kind = match self.config.default_backend {
            Some(kind) => kind,
            None => self.provider.detect(self.host.as_ref())?,
        };
        self.get_instance_of(kind)
    }

    /// Returns the session for `kind`, creating it on first use.
    ///
    /// Fails with [`EngineError::EnvironmentError`] if the host cannot run the
    /// backend and with [`EngineError::InitializationError`] if the host document
    /// has no canvas element. Failures are not cached; a later call tries again.
    pub fn get_instance_of(&self, kind: BackendKind) -> Result<SessionHandle, EngineError> {
        let mut sessions = self.sessions.lock().map_err(|_| EngineError::Poisoned)?;
        if let Some(handle) = sessions.get(&kind) {
            return Ok(handle.clone());
        }

        let factory = self.provider.resolve(kind, self.host.as_ref())?;
        let element = self
            .host
            .canvas()
            .ok_or_else(|| {
                EngineError::InitializationError("no canvas element found in host document".into())
            })?;

        let session = factory.create_session(element, self.bus.clone(), &self.config)?;
        let handle: SessionHandle = Arc::new(Mutex::new(session));

        if let Some(autosave) = self.autosave.as_ref().filter(|_| self.config.autosave.enabled) {
            let join = AutosaveWorker::attach(
                &handle,
                autosave.store.clone(),
                self.config.autosave.capacity,
                autosave.cancel.child_token(),
            )?;
            autosave.workers.lock().map_err(|_| EngineError::Poisoned)?.push(join);
        }

        log::info!("registry: created {} session for host '{}'", kind, self.host.user_agent());
        sessions.insert(kind, handle.clone());
        Ok(handle)
    }

    pub fn contains(&self, kind: BackendKind) -> bool {
        self.sessions.lock().map(|s| s.contains_key(&kind)).unwrap_or(false)
    }

    /// Kinds that already have a session.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.sessions
            .lock()
            .map(|s| {
                BackendKind::PREFERENCE
                    .iter()
                    .copied()
                    .filter(|k| s.contains_key(k))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stops all autosave workers. The returned handles resolve once each worker has exited.
    pub fn shutdown(&self) -> Vec<JoinHandle<()>> {
        match &self.autosave {
            Some(autosave) => {
                autosave.cancel.cancel();
                autosave
                    .workers
                    .lock()
                    .map(|mut w| w.drain(..).collect())
                    .unwrap_or_default()
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::host::{Capabilities, StaticHost};
    use crate::engine::persist::InMemorySnapshotStore;
    use crate::render::{Color, DisplayItem};
    use std::time::Duration;

    #[test]
    fn same_kind_returns_same_session() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));

        let a = registry.get_instance("chrome").unwrap();
        let b = registry.get_instance("chrome").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let id = a.lock().unwrap().id();
        assert_eq!(b.lock().unwrap().id(), id);
    }

    #[test]
    fn different_kinds_get_different_sessions() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));

        let modern = registry.get_instance("modern").unwrap();
        let legacy = registry.get_instance("ie").unwrap();
        assert!(!Arc::ptr_eq(&modern, &legacy));
        assert_eq!(registry.kinds(), vec![BackendKind::Modern, BackendKind::Legacy]);
    }

    #[test]
    fn repeated_calls_do_not_reinitialize() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));

        let a = registry.get_instance("modern").unwrap();
        a.lock().unwrap().save().unwrap();

        let b = registry.get_instance("modern").unwrap();
        assert_eq!(b.lock().unwrap().history().len(), 1);
    }

    #[test]
    fn unknown_kind_is_configuration_error() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));
        let err = registry.get_instance("firefox").unwrap_err();
        assert!(matches!(err, EngineError::ConfigurationError(_)));
        assert!(registry.kinds().is_empty());
    }

    #[test]
    fn missing_canvas_is_initialization_error_and_not_cached() {
        let host = StaticHost::modern().without_canvas();
        let registry = SessionRegistry::with_defaults(Arc::new(host));
        let err = registry.get_instance("modern").unwrap_err();
        assert!(matches!(err, EngineError::InitializationError(_)));
        assert!(!registry.contains(BackendKind::Modern));
    }

    #[test]
    fn missing_capability_is_environment_error() {
        let host = StaticHost::modern().with_capabilities(Capabilities::CANVAS_ELEMENT);
        let registry = SessionRegistry::with_defaults(Arc::new(host));
        let err = registry.get_instance("legacy").unwrap_err();
        assert!(matches!(err, EngineError::EnvironmentError(_)));
    }

    #[test]
    fn default_session_follows_config_then_detection() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::legacy()));
        let session = registry.get_default().unwrap();
        assert_eq!(session.lock().unwrap().kind(), BackendKind::Legacy);

        let mut config = EngineConfig::default();
        config.default_backend = Some(BackendKind::Modern);
        let registry = SessionRegistry::new(
            config,
            Arc::new(StaticHost::modern()),
            BackendProvider::new(),
            Arc::new(InMemoryBus::new()),
        );
        assert_eq!(registry.get_default().unwrap().lock().unwrap().kind(), BackendKind::Modern);
    }

    #[test]
    fn sessions_share_the_registry_bus() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));
        let session = registry.get_instance("modern").unwrap();
        let bus = session.lock().unwrap().bus();
        assert!(Arc::ptr_eq(&bus, &registry.bus()));
    }

    #[tokio::test]
    async fn autosave_attaches_when_enabled() {
        let mut config = EngineConfig::default();
        config.autosave.enabled = true;
        let store = Arc::new(InMemorySnapshotStore::new());

        let registry = SessionRegistry::new(
            config,
            Arc::new(StaticHost::modern()),
            BackendProvider::new(),
            Arc::new(InMemoryBus::new()),
        )
        .with_autosave(store.clone());

        let handle = registry.get_instance("modern").unwrap();
        {
            let mut session = handle.lock().unwrap();
            session.draw(DisplayItem::Clear { color: Color::BLACK }).unwrap();
            session.save().unwrap();
        }

        let mut persisted = false;
        for _ in 0..100 {
            if store.get("modern").unwrap().is_some() {
                persisted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(persisted);

        for join in registry.shutdown() {
            join.await.unwrap();
        }
    }

    #[test]
    fn autosave_is_skipped_when_disabled() {
        // No runtime here: attaching would fail, so success proves it was skipped
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()))
            .with_autosave(Arc::new(InMemorySnapshotStore::new()));
        registry.get_instance("modern").unwrap();
        assert!(registry.shutdown().is_empty());
    }
}
