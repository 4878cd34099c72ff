//! Notification bus for session lifecycle events.
//!
//! The bus maps an event name (a *channel*) to an ordered list of
//! [`Listener`]s. A drawing session publishes events such as `save` or `undo`
//! without knowing who listens; the menu, the history indicator and
//! persistence subscribe on their own.
//!
//! # Contract
//!
//! - Channels are created with [`EventBus::ensure_channel`]. Requesting an
//!   existing channel returns it unchanged.
//! - Subscribing or publishing on a channel that was never created fails with
//!   [`EngineError::UnknownChannel`].
//! - Listener names are unique per channel. A second subscription under the
//!   same name is rejected with [`EngineError::DuplicateSubscriber`].
//! - Unsubscribing an unknown name is a no-op.
//! - Publishing calls every listener synchronously, in subscription order,
//!   before returning. The listener list is copied first, so listeners may
//!   (un)subscribe from inside their callback without affecting the
//!   delivery in progress.
//!
//! [`InMemoryBus`] is the in-process implementation. The trait exists so an
//! external broker can be dropped in without touching the session.
//!
//! ```
//! use std::sync::Arc;
//! use grimpan::bus::{EventBus, FnListener, InMemoryBus};
//!
//! let bus = InMemoryBus::new();
//! bus.ensure_channel("save").unwrap();
//! bus.subscribe("save", Arc::new(FnListener::new("status", |event| {
//!     println!("got {event}");
//! }))).unwrap();
//!
//! assert_eq!(bus.publish("save").unwrap(), 1);
//! ```

use std::sync::Arc;

use crate::engine::errors::EngineError;

mod in_memory;
mod listener;

pub use in_memory::InMemoryBus;
pub use listener::{BroadcastListener, FnListener, Listener};

/// Shared handle to a bus implementation.
pub type BusHandle = Arc<dyn EventBus>;

/// Named-channel publish/subscribe registry.
pub trait EventBus: Send + Sync {
    /// Creates `event` if it does not exist and returns the names of its
    /// current subscribers, in subscription order.
    fn ensure_channel(&self, event: &str) -> Result<Vec<String>, EngineError>;

    /// Adds `listener` to the end of `event`'s subscriber list.
    fn subscribe(&self, event: &str, listener: Arc<dyn Listener>) -> Result<(), EngineError>;

    /// Removes the listener called `name` from `event`. Returns whether anything was removed.
    fn unsubscribe(&self, event: &str, name: &str) -> Result<bool, EngineError>;

    /// Delivers `event` to every subscriber. Returns the number of listeners called.
    fn publish(&self, event: &str) -> Result<usize, EngineError>;

    /// Subscriber names of `event`, or `None` if the channel does not exist.
    fn subscribers(&self, event: &str) -> Result<Option<Vec<String>>, EngineError>;

    /// Names of all channels, sorted.
    fn channels(&self) -> Result<Vec<String>, EngineError>;
}
