//! The live canvas a session draws on.
//!
//! A [`Canvas`] binds a host canvas element to a backend surface and keeps the
//! vector [`RenderList`] that makes up the current picture. Every mutation is
//! replayed through the backend immediately.

use crate::engine::host::CanvasElement;
use crate::engine::snapshot::CanvasSnapshot;
use crate::render::backend::{ErasedSurface, RenderBackend, RgbaImage, SurfaceSize};
use crate::render::{Color, DisplayItem, RenderList};
use anyhow::Result;

pub struct Canvas {
    element: CanvasElement,
    backend: Box<dyn RenderBackend + Send>,
    surface: Box<dyn ErasedSurface + Send>,
    list: RenderList,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("element", &self.element)
            .field("backend", &self.backend.name())
            .field("items", &self.list.len())
            .finish()
    }
}

impl Canvas {
    /// Creates a canvas for `element`, allocating a surface of the element's size on `backend`.
    pub fn new(element: CanvasElement, backend: Box<dyn RenderBackend + Send>) -> Result<Self> {
        let surface = backend.create_surface(element.size())?;
        Ok(Self {
            element,
            backend,
            surface,
            list: RenderList::new(),
        })
    }

    pub fn element(&self) -> &CanvasElement {
        &self.element
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn size(&self) -> SurfaceSize {
        self.surface.size()
    }

    /// Current display list. Read-only: all mutation goes through the canvas.
    pub fn list(&self) -> &RenderList {
        &self.list
    }

    pub fn surface(&self) -> &dyn ErasedSurface {
        self.surface.as_ref()
    }

    /// Appends `item` to the picture and re-renders.
    pub fn draw(&mut self, item: DisplayItem) -> Result<()> {
        self.list.add_command(item);
        self.render()
    }

    /// Wipes the picture to `color` and re-renders.
    pub fn clear(&mut self, color: Color) -> Result<()> {
        self.draw(DisplayItem::Clear { color })
    }

    /// Captures the current picture. The snapshot owns a deep copy of the list,
    /// so later drawing never reaches it.
    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot::capture(&self.list, self.size())
    }

    /// Replaces the picture with the contents of `snapshot`, or a blank canvas for `None`.
    pub fn restore(&mut self, snapshot: Option<&CanvasSnapshot>) -> Result<()> {
        self.list = match snapshot {
            Some(snapshot) => snapshot.to_render_list(),
            None => RenderList::new(),
        };
        self.render()
    }

    /// Small preview of the surface, no side longer than `max_dim`.
    pub fn thumbnail(&mut self, max_dim: u32) -> Result<RgbaImage> {
        self.backend.snapshot(self.surface.as_mut(), max_dim)
    }

    fn render(&mut self) -> Result<()> {
        self.backend.render(&self.list, self.surface.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::modern::{ModernBackend, ModernSurface};
    use crate::render::Point;

    fn canvas() -> Canvas {
        let element = CanvasElement::new("canvas", 100, 50);
        Canvas::new(element, Box::new(ModernBackend::new().unwrap())).unwrap()
    }

    #[test]
    fn draw_renders_through_backend() {
        let mut c = canvas();
        c.draw(DisplayItem::Stroke {
            points: vec![Point::new(0.0, 0.0)],
            width: 1.0,
            color: Color::BLACK,
        })
        .unwrap();

        let s = c.surface().as_any().downcast_ref::<ModernSurface>().unwrap();
        assert_eq!(s.frame_id, 1);
        assert_eq!(s.items_drawn, 1);
        assert_eq!(c.size(), SurfaceSize::new(100, 50));
    }

    #[test]
    fn snapshot_is_not_aliased_to_live_canvas() {
        let mut c = canvas();
        c.draw(DisplayItem::Rect { x: 0.0, y: 0.0, w: 1.0, h: 1.0, color: Color::BLACK }).unwrap();
        let snap = c.snapshot();

        c.draw(DisplayItem::Rect { x: 5.0, y: 5.0, w: 1.0, h: 1.0, color: Color::WHITE }).unwrap();
        assert_eq!(snap.items().len(), 1);
        assert_eq!(c.list().len(), 2);
    }

    #[test]
    fn restore_none_blanks_the_canvas() {
        let mut c = canvas();
        c.clear(Color::BLACK).unwrap();
        let snap = c.snapshot();

        c.restore(None).unwrap();
        assert!(c.list().is_empty());

        c.restore(Some(&snap)).unwrap();
        assert_eq!(c.list(), &snap.to_render_list());
    }
}
