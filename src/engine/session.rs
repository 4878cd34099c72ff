//! Drawing session: the façade application code talks to.
//!
//! A [`Session`] owns the canvas (and through it the backend surface), the
//! undo/redo [`HistoryStore`] and the current [`DrawingMode`]. It holds a
//! reference to the shared notification bus and publishes its lifecycle
//! events there instead of calling the menu or persistence directly.
//!
//! Sessions are not created by hand; ask a
//! [`SessionRegistry`](crate::registry::SessionRegistry) for one.
//!
//! ```
//! use std::sync::Arc;
//! use grimpan::host::StaticHost;
//! use grimpan::registry::SessionRegistry;
//! use grimpan::session::{DrawingMode, SessionOptions};
//!
//! let registry = SessionRegistry::with_defaults(Arc::new(StaticHost::modern()));
//! let handle = registry.get_instance("chrome").unwrap();
//!
//! let mut session = handle.lock().unwrap();
//! session.initialize(&SessionOptions::default()).unwrap();
//! session.set_mode(DrawingMode::Circle).unwrap();
//! session.save().unwrap();
//! assert_eq!(session.history().len(), 1);
//! ```

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::bus::BusHandle;
use crate::engine::errors::EngineError;
use crate::engine::events::SessionEvent;
use crate::engine::history::HistoryStore;
use crate::engine::persist::SnapshotStore;
use crate::engine::provider::BackendKind;
use crate::engine::snapshot::CanvasSnapshot;
use crate::render::backend::RgbaImage;
use crate::render::{Canvas, Color, DisplayItem, Point};

mod menu;
mod mode;
mod options;

pub use menu::{Menu, MenuStatus, StatusMenu};
pub use mode::DrawingMode;
pub use options::{MenuConfig, SessionOptions};

const DEFAULT_LINE_WIDTH: f32 = 2.0;

/// A unique identifier for a session, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn render_err(e: anyhow::Error) -> EngineError {
    EngineError::RendererError(e.to_string())
}

pub struct Session {
    id: SessionId,
    kind: BackendKind,
    /// Live canvas; only mutated through session operations
    canvas: Canvas,
    history: HistoryStore,
    /// Snapshot taken by the latest `save`, unaffected by undo/redo
    last_saved: Option<CanvasSnapshot>,
    mode: DrawingMode,
    /// Paint color for pen and shapes, updated by the pipette
    color: Color,
    line_width: f32,
    menu: Box<dyn Menu>,
    bus: BusHandle,
    initialized: bool,
    thumbnail_size: u32,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("mode", &self.mode)
            .field("canvas", &self.canvas)
            .field("history", &self.history.len())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl Session {
    /// Builds a session around an already created canvas and collaborators.
    ///
    /// All session channels are created on `bus` here, so publishing works
    /// even before [`initialize`](Self::initialize).
    pub fn new(
        kind: BackendKind,
        canvas: Canvas,
        history: HistoryStore,
        menu: Box<dyn Menu>,
        bus: BusHandle,
        thumbnail_size: u32,
    ) -> Result<Self, EngineError> {
        for event in SessionEvent::ALL {
            bus.ensure_channel(event.channel())?;
        }

        let id = SessionId::new();
        log::info!("Session[{}]: created on {} ({})", id, canvas.backend_name(), kind);

        Ok(Self {
            id,
            kind,
            canvas,
            history,
            last_saved: None,
            mode: DrawingMode::default(),
            color: Color::BLACK,
            line_width: DEFAULT_LINE_WIDTH,
            menu,
            bus,
            initialized: false,
            thumbnail_size,
        })
    }

    /// Wires the menu and subscribes it on the session channels.
    ///
    /// Calling this again after a successful run is a no-op, so listeners
    /// are never registered twice. A failed run leaves nothing subscribed
    /// and may be retried.
    pub fn initialize(&mut self, options: &SessionOptions) -> Result<(), EngineError> {
        if self.initialized {
            log::debug!("Session[{}]: already initialized, skipping", self.id);
            return Ok(());
        }

        self.menu.initialize(&options.menu)?;

        let listener = self.menu.listener();
        let mut subscribed = Vec::new();
        for event in SessionEvent::ALL {
            if let Err(e) = self.bus.subscribe(event.channel(), listener.clone()) {
                for channel in subscribed {
                    if let Err(e) = self.bus.unsubscribe(channel, listener.name()) {
                        log::warn!(
                            "Session[{}]: cannot roll back '{}' on {}: {}",
                            self.id,
                            listener.name(),
                            channel,
                            e
                        );
                    }
                }
                return Err(e);
            }
            subscribed.push(event.channel());
        }

        self.initialized = true;
        log::info!("Session[{}]: initialized, menu '{}' listening", self.id, self.menu.name());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width.max(0.0);
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Snapshot captured by the most recent [`save`](Self::save), if any.
    pub fn last_saved(&self) -> Option<&CanvasSnapshot> {
        self.last_saved.as_ref()
    }

    pub fn menu(&self) -> &dyn Menu {
        self.menu.as_ref()
    }

    pub fn bus(&self) -> BusHandle {
        self.bus.clone()
    }

    /// Detached copy of the history, for previews or speculative edits.
    pub fn fork_history(&self) -> HistoryStore {
        self.history.clone()
    }

    /// Switches the active tool and publishes `mode`.
    pub fn set_mode(&mut self, mode: DrawingMode) -> Result<(), EngineError> {
        log::debug!("Session[{}]: mode {} -> {}", self.id, self.mode, mode);
        self.mode = mode;
        self.publish(SessionEvent::ModeChanged)
    }

    /// Like [`set_mode`](Self::set_mode) for a mode given by name. An unknown
    /// name fails with [`EngineError::InvalidMode`] and keeps the current mode.
    pub fn set_mode_named(&mut self, name: &str) -> Result<(), EngineError> {
        let mode = name.parse::<DrawingMode>()?;
        self.set_mode(mode)
    }

    /// Adds a display item to the live canvas.
    pub fn draw(&mut self, item: DisplayItem) -> Result<(), EngineError> {
        self.canvas.draw(item).map_err(render_err)
    }

    /// Applies a pointer gesture through `points` with the active tool.
    ///
    /// Pen and eraser follow the path. Circle uses the first point as the
    /// center and the last as a point on the rim; rectangle spans both. The
    /// pipette picks the color under the last point and draws nothing.
    /// Returns the item that was drawn, if any.
    pub fn gesture(&mut self, points: &[Point]) -> Result<Option<DisplayItem>, EngineError> {
        let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) else {
            return Ok(None);
        };

        let item = match self.mode {
            DrawingMode::Pen => DisplayItem::Stroke {
                points: points.to_vec(),
                width: self.line_width,
                color: self.color,
            },
            DrawingMode::Eraser => DisplayItem::Erase {
                points: points.to_vec(),
                width: self.line_width,
            },
            DrawingMode::Circle => {
                let (dx, dy) = (last.x - first.x, last.y - first.y);
                DisplayItem::Circle {
                    center: first,
                    radius: (dx * dx + dy * dy).sqrt(),
                    color: self.color,
                }
            }
            DrawingMode::Rectangle => DisplayItem::Rect {
                x: first.x.min(last.x),
                y: first.y.min(last.y),
                w: (last.x - first.x).abs(),
                h: (last.y - first.y).abs(),
                color: self.color,
            },
            DrawingMode::Pipette => {
                self.color = self.canvas.list().color_at(last);
                log::debug!("Session[{}]: pipette picked {:?}", self.id, self.color);
                return Ok(None);
            }
        };

        self.draw(item.clone())?;
        Ok(Some(item))
    }

    /// Wipes the canvas to white and publishes `clear`. History is untouched
    /// until the next save.
    pub fn clear(&mut self) -> Result<(), EngineError> {
        self.canvas.clear(Color::WHITE).map_err(render_err)?;
        self.publish(SessionEvent::Clear)
    }

    /// Captures the canvas, records it in history and publishes `save`.
    pub fn save(&mut self) -> Result<CanvasSnapshot, EngineError> {
        let snapshot = self.canvas.snapshot();
        self.history.record(snapshot.clone());
        self.last_saved = Some(snapshot.clone());
        log::info!(
            "Session[{}]: saved snapshot {} with {} items",
            self.id,
            self.history.len(),
            snapshot.items().len()
        );

        self.publish(SessionEvent::SaveComplete)?;
        Ok(snapshot)
    }

    /// Steps history back and restores the canvas to the snapshot now current
    /// (blank when history is back at its start). Publishes `undo`.
    pub fn undo(&mut self) -> Result<Option<CanvasSnapshot>, EngineError> {
        let snapshot = self.history.undo()?;
        self.canvas.restore(snapshot.as_ref()).map_err(render_err)?;
        self.publish(SessionEvent::Undo)?;
        Ok(snapshot)
    }

    /// Steps history forward and restores the canvas to it. Publishes `redo`.
    pub fn redo(&mut self) -> Result<CanvasSnapshot, EngineError> {
        let snapshot = self.history.redo()?;
        self.canvas.restore(Some(&snapshot)).map_err(render_err)?;
        self.publish(SessionEvent::Redo)?;
        Ok(snapshot)
    }

    /// Replaces the canvas with a previously persisted snapshot and records it.
    pub fn load(&mut self, snapshot: CanvasSnapshot) -> Result<(), EngineError> {
        if snapshot.size() != self.canvas.size() {
            log::warn!(
                "Session[{}]: loading a {}x{} snapshot onto a {}x{} canvas",
                self.id,
                snapshot.size().width,
                snapshot.size().height,
                self.canvas.size().width,
                self.canvas.size().height
            );
        }
        self.canvas.restore(Some(&snapshot)).map_err(render_err)?;
        self.history.record(snapshot);
        Ok(())
    }

    /// Loads the snapshot stored under `key` in `store`.
    pub fn load_from(&mut self, store: &dyn SnapshotStore, key: &str) -> Result<(), EngineError> {
        let snapshot = store
            .get(key)
            .map_err(|e| EngineError::PersistenceError(e.to_string()))?
            .ok_or_else(|| {
                EngineError::PersistenceError(format!("no snapshot stored under '{}'", key))
            })?;
        self.load(snapshot)
    }

    /// Menu-sized preview of the canvas.
    pub fn thumbnail(&mut self) -> Result<RgbaImage, EngineError> {
        self.canvas.thumbnail(self.thumbnail_size).map_err(render_err)
    }

    fn publish(&self, event: SessionEvent) -> Result<(), EngineError> {
        self.bus.publish(event.channel()).map(|_| ())
    }
}
