use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{EventBus, Listener};
use crate::engine::errors::EngineError;

type Channels = HashMap<String, Vec<Arc<dyn Listener>>>;

/// In-process [`EventBus`] keeping channels in a map guarded by a `RwLock`.
#[derive(Default)]
pub struct InMemoryBus {
    channels: RwLock<Channels>,
}

impl std::fmt::Debug for InMemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBus").finish_non_exhaustive()
    }
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }
}

fn names(listeners: &[Arc<dyn Listener>]) -> Vec<String> {
    listeners.iter().map(|l| l.name().to_string()).collect()
}

impl EventBus for InMemoryBus {
    fn ensure_channel(&self, event: &str) -> Result<Vec<String>, EngineError> {
        let mut channels = self.channels.write().map_err(|_| EngineError::Poisoned)?;
        let listeners = channels.entry(event.to_string()).or_insert_with(|| {
            log::debug!("bus: created channel '{}'", event);
            Vec::new()
        });
        Ok(names(listeners))
    }

    fn subscribe(&self, event: &str, listener: Arc<dyn Listener>) -> Result<(), EngineError> {
        let mut channels = self.channels.write().map_err(|_| EngineError::Poisoned)?;
        let listeners = channels
            .get_mut(event)
            .ok_or_else(|| EngineError::UnknownChannel(event.to_string()))?;

        if listeners.iter().any(|l| l.name() == listener.name()) {
            return Err(EngineError::DuplicateSubscriber {
                channel: event.to_string(),
                name: listener.name().to_string(),
            });
        }

        log::debug!("bus: '{}' subscribed to '{}'", listener.name(), event);
        listeners.push(listener);
        Ok(())
    }

    fn unsubscribe(&self, event: &str, name: &str) -> Result<bool, EngineError> {
        let mut channels = self.channels.write().map_err(|_| EngineError::Poisoned)?;
        let Some(listeners) = channels.get_mut(event) else {
            return Ok(false);
        };

        let before = listeners.len();
        listeners.retain(|l| l.name() != name);
        Ok(listeners.len() != before)
    }

    fn publish(&self, event: &str) -> Result<usize, EngineError> {
        // Copy the list and release the lock before calling out, so listeners
        // can touch the bus from inside their callback.
        let listeners = {
            let channels = self.channels.read().map_err(|_| EngineError::Poisoned)?;
            channels
                .get(event)
                .cloned()
                .ok_or_else(|| EngineError::UnknownChannel(event.to_string()))?
        };

        log::debug!("bus: publishing '{}' to {} listener(s)", event, listeners.len());
        for listener in listeners.iter() {
            listener.publish(event);
        }

        Ok(listeners.len())
    }

    fn subscribers(&self, event: &str) -> Result<Option<Vec<String>>, EngineError> {
        let channels = self.channels.read().map_err(|_| EngineError::Poisoned)?;
        Ok(channels.get(event).map(|l| names(l)))
    }

    fn channels(&self) -> Result<Vec<String>, EngineError> {
        let channels = self.channels.read().map_err(|_| EngineError::Poisoned)?;
        let mut keys: Vec<String> = channels.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bus::FnListener;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(name: &str, log: &Log) -> Arc<dyn Listener> {
        let log = log.clone();
        let tag = name.to_string();
        Arc::new(FnListener::new(name, move |event| {
            log.lock().unwrap().push(format!("{}:{}", tag, event));
        }))
    }

    #[test]
    fn ensure_channel_twice_does_not_reset_subscribers() {
        let bus = InMemoryBus::new();
        let log: Log = Default::default();

        bus.ensure_channel("save").unwrap();
        bus.subscribe("save", recorder("a", &log)).unwrap();
        let existing = bus.ensure_channel("save").unwrap();

        assert_eq!(existing, vec!["a"]);
        assert_eq!(bus.publish("save").unwrap(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["a:save"]);
    }

    #[test]
    fn double_ensure_then_single_subscribe_delivers_once() {
        let bus = InMemoryBus::new();
        let log: Log = Default::default();

        bus.ensure_channel("save").unwrap();
        bus.ensure_channel("save").unwrap();
        bus.subscribe("save", recorder("a", &log)).unwrap();
        bus.publish("save").unwrap();

        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn subscribe_and_publish_require_channel() {
        let bus = InMemoryBus::new();
        let log: Log = Default::default();

        let err = bus.subscribe("save", recorder("a", &log)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownChannel(ref c) if c == "save"));

        let err = bus.publish("save").unwrap_err();
        assert!(matches!(err, EngineError::UnknownChannel(_)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let bus = InMemoryBus::new();
        let log: Log = Default::default();
        bus.ensure_channel("save").unwrap();

        bus.subscribe("save", recorder("menu", &log)).unwrap();
        let err = bus.subscribe("save", recorder("menu", &log)).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSubscriber { .. }));

        bus.publish("save").unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn same_name_on_different_channels_is_fine() {
        let bus = InMemoryBus::new();
        let log: Log = Default::default();
        bus.ensure_channel("save").unwrap();
        bus.ensure_channel("undo").unwrap();

        bus.subscribe("save", recorder("menu", &log)).unwrap();
        bus.subscribe("undo", recorder("menu", &log)).unwrap();
    }

    #[test]
    fn publish_preserves_subscription_order() {
        let bus = InMemoryBus::new();
        let log: Log = Default::default();
        bus.ensure_channel("clear").unwrap();

        for name in ["first", "second", "third"] {
            bus.subscribe("clear", recorder(name, &log)).unwrap();
        }
        bus.publish("clear").unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first:clear", "second:clear", "third:clear"]);
    }

    #[test]
    fn unsubscribe_unknown_is_noop() {
        let bus = InMemoryBus::new();
        let log: Log = Default::default();
        bus.ensure_channel("save").unwrap();
        bus.subscribe("save", recorder("a", &log)).unwrap();

        assert!(!bus.unsubscribe("save", "nobody").unwrap());
        assert!(!bus.unsubscribe("missing-channel", "a").unwrap());
        assert!(bus.unsubscribe("save", "a").unwrap());
        assert_eq!(bus.publish("save").unwrap(), 0);
    }

    #[test]
    fn unsubscribing_during_publish_does_not_skip_others() {
        let bus = Arc::new(InMemoryBus::new());
        let log: Log = Default::default();
        bus.ensure_channel("save").unwrap();

        // "a" removes "b" while the publish is in flight
        let bus_ref = bus.clone();
        let a_log = log.clone();
        bus.subscribe(
            "save",
            Arc::new(FnListener::new("a", move |event| {
                a_log.lock().unwrap().push(format!("a:{}", event));
                bus_ref.unsubscribe("save", "b").unwrap();
            })),
        )
        .unwrap();
        bus.subscribe("save", recorder("b", &log)).unwrap();
        bus.subscribe("save", recorder("c", &log)).unwrap();

        assert_eq!(bus.publish("save").unwrap(), 3);
        assert_eq!(*log.lock().unwrap(), vec!["a:save", "b:save", "c:save"]);

        // Next publish sees the removal
        log.lock().unwrap().clear();
        assert_eq!(bus.publish("save").unwrap(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["a:save", "c:save"]);
    }

    #[test]
    fn channels_are_listed_sorted() {
        let bus = InMemoryBus::new();
        bus.ensure_channel("undo").unwrap();
        bus.ensure_channel("save").unwrap();

        assert_eq!(bus.channels().unwrap(), vec!["save", "undo"]);
        assert_eq!(bus.subscribers("save").unwrap(), Some(vec![]));
        assert_eq!(bus.subscribers("redo").unwrap(), None);
    }
}
