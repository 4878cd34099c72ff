use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::SnapshotStore;
use crate::engine::bus::{BroadcastListener, BusHandle};
use crate::engine::errors::EngineError;
use crate::engine::events::SessionEvent;
use crate::engine::registry::SessionHandle;

/// Persists the snapshot a session last saved every time it publishes `save`.
///
/// The worker subscribes a [`BroadcastListener`] named `autosave:<kind>` on
/// the session's bus and runs on its own tokio task. It stops when `cancel`
/// fires or the listener is dropped, and unsubscribes itself on the way out.
pub struct AutosaveWorker {
    session: SessionHandle,
    bus: BusHandle,
    key: String,
    listener_name: String,
    store: Arc<dyn SnapshotStore>,
    rx: broadcast::Receiver<String>,
    cancel: CancellationToken,
}

impl AutosaveWorker {
    /// Subscribes on `session`'s bus and spawns the worker on the current
    /// tokio runtime.
    ///
    /// Fails with [`EngineError::InitializationError`] outside a runtime, or with a
    /// bus error if an autosave worker is already attached to this kind.
    pub fn attach(
        session: &SessionHandle,
        store: Arc<dyn SnapshotStore>,
        capacity: usize,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>, EngineError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            EngineError::InitializationError("autosave requires a running tokio runtime".into())
        })?;

        let (bus, key) = {
            let guard = session.lock().map_err(|_| EngineError::Poisoned)?;
            (guard.bus(), guard.kind().to_string())
        };

        let listener_name = format!("autosave:{}", key);
        let (listener, rx) = BroadcastListener::new(&listener_name, capacity);
        bus.subscribe(SessionEvent::SaveComplete.channel(), Arc::new(listener))?;

        let worker = Self {
            session: session.clone(),
            bus,
            key,
            listener_name,
            store,
            rx,
            cancel,
        };

        Ok(runtime.spawn(worker.run()))
    }

    async fn run(mut self) {
        log::debug!("{}: started", self.listener_name);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Ok(event) if event == SessionEvent::SaveComplete.channel() => {
                        self.persist_logged()
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        // Only the latest state matters, so one write covers the skipped saves.
                        log::warn!("{}: lagged {} events", self.listener_name, skipped);
                        self.persist_logged();
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        let channel = SessionEvent::SaveComplete.channel();
        if let Err(e) = self.bus.unsubscribe(channel, &self.listener_name) {
            log::warn!("{}: cannot unsubscribe: {}", self.listener_name, e);
        }
        log::debug!("{}: stopped", self.listener_name);
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            log::error!("{}: {}", self.listener_name, e);
        }
    }

    fn persist(&self) -> anyhow::Result<()> {
        let snapshot = {
            let session = self.session.lock().map_err(|_| anyhow!("session lock poisoned"))?;
            session.last_saved().cloned()
        };

        match snapshot {
            Some(snapshot) => {
                self.store.put(&self.key, &snapshot)?;
                log::debug!("{}: persisted {} items", self.listener_name, snapshot.items().len());
            }
            None => log::debug!("{}: nothing saved yet", self.listener_name),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::host::StaticHost;
    use crate::engine::persist::InMemorySnapshotStore;
    use crate::engine::registry::SessionRegistry;
    use crate::render::{Color, DisplayItem};
    use std::time::Duration;

    async fn wait_for_key(store: &InMemorySnapshotStore, key: &str) -> bool {
        for _ in 0..100 {
            if store.get(key).unwrap().is_some() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn save_is_persisted_in_background() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));
        let handle = registry.get_instance("modern").unwrap();
        let store = Arc::new(InMemorySnapshotStore::new());
        let cancel = CancellationToken::new();

        let join = AutosaveWorker::attach(&handle, store.clone(), 8, cancel.clone()).unwrap();

        let saved = {
            let mut session = handle.lock().unwrap();
            session.draw(DisplayItem::Clear { color: Color::BLACK }).unwrap();
            session.save().unwrap()
        };

        assert!(wait_for_key(&store, "modern").await);
        assert_eq!(store.get("modern").unwrap(), Some(saved));

        cancel.cancel();
        join.await.unwrap();

        // The worker removed its listener on the way out
        let subscribers = registry.bus().subscribers("save").unwrap().unwrap();
        assert!(!subscribers.contains(&"autosave:modern".to_string()));
    }

    #[tokio::test]
    async fn undo_before_worker_runs_keeps_saved_snapshot() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));
        let handle = registry.get_instance("modern").unwrap();
        let store = Arc::new(InMemorySnapshotStore::new());
        let cancel = CancellationToken::new();

        let join = AutosaveWorker::attach(&handle, store.clone(), 8, cancel.clone()).unwrap();

        // The worker only gets to run at the first await below, after the undo
        let saved = {
            let mut session = handle.lock().unwrap();
            session.draw(DisplayItem::Clear { color: Color::BLACK }).unwrap();
            let saved = session.save().unwrap();
            assert_eq!(session.undo().unwrap(), None);
            saved
        };

        assert!(wait_for_key(&store, "modern").await);
        assert_eq!(store.get("modern").unwrap(), Some(saved));

        cancel.cancel();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn second_worker_for_same_session_is_rejected() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));
        let handle = registry.get_instance("modern").unwrap();
        let store: Arc<dyn SnapshotStore> = Arc::new(InMemorySnapshotStore::new());
        let cancel = CancellationToken::new();

        let _join = AutosaveWorker::attach(&handle, store.clone(), 8, cancel.clone()).unwrap();
        let err = AutosaveWorker::attach(&handle, store, 8, cancel.clone()).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSubscriber { .. }));

        cancel.cancel();
    }

    #[test]
    fn attach_outside_runtime_fails() {
        let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));
        let handle = registry.get_instance("modern").unwrap();

        let err = AutosaveWorker::attach(
            &handle,
            Arc::new(InMemorySnapshotStore::new()),
            8,
            CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InitializationError(_)));
    }
}
