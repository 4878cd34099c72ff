use std::fmt::Debug;

use tokio::sync::broadcast;

/// Something that wants to hear about bus events.
pub trait Listener: Send + Sync {
    /// Name of the listener, unique within a channel.
    fn name(&self) -> &str;

    /// Called with the event name on every publish of a subscribed channel.
    fn publish(&self, event: &str);
}

impl Debug for dyn Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("name", &self.name()).finish_non_exhaustive()
    }
}

/// Listener backed by a closure.
pub struct FnListener {
    name: String,
    callback: Box<dyn Fn(&str) + Send + Sync>,
}

impl FnListener {
    pub fn new<F>(name: &str, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            callback: Box::new(callback),
        }
    }
}

impl Listener for FnListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, event: &str) {
        (self.callback)(event)
    }
}

/// Forwards event names into a tokio broadcast channel.
///
/// This is how work that must not run inside `publish` (disk or network I/O)
/// hooks into the bus: the listener only enqueues, and async tasks holding a
/// receiver do the rest on their own time.
pub struct BroadcastListener {
    name: String,
    tx: broadcast::Sender<String>,
}

impl BroadcastListener {
    /// Creates a listener and its channel. More receivers can be made with
    /// [`BroadcastListener::receiver`].
    pub fn new(name: &str, capacity: usize) -> (Self, broadcast::Receiver<String>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        (
            Self {
                name: name.to_string(),
                tx,
            },
            rx,
        )
    }

    pub fn receiver(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Listener for BroadcastListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, event: &str) {
        // send() only fails when nobody holds a receiver; nothing to deliver then.
        if self.tx.send(event.to_string()).is_err() {
            log::debug!("BroadcastListener[{}]: no receivers for '{}'", self.name, event);
        }
    }
}
